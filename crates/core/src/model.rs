// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTOs exchanged between the Engine Adapter and the Session Manager.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mirrors `lldb::StateType`: the engine reports these as plain integers
/// on the wire, but internally we keep a real enum so handlers can match
/// on it instead of memorizing magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ProcessState {
    Invalid = 0,
    Unloaded = 1,
    Connected = 2,
    Attaching = 3,
    Launching = 4,
    Stopped = 5,
    Running = 6,
    Stepping = 7,
    Crashed = 8,
    Detached = 9,
    Exited = 10,
    Suspended = 11,
}

impl ProcessState {
    pub fn is_stopped(self) -> bool {
        matches!(self, ProcessState::Stopped | ProcessState::Crashed)
    }
}

/// Parameters captured from `launch` so `restart` can reproduce them
/// through the structured launch-info path (`restart`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchParams {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub flags: HashMap<String, String>,
}

/// Exactly one of `pid`/`name` is populated; enforced by the caller.
#[derive(Debug, Clone)]
pub enum AttachRequest {
    Pid(u32),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakpointLocation<'a> {
    FileLine { file: &'a str, line: u32 },
    Symbol(&'a str),
    Address(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointInfo {
    pub id: i32,
    pub enabled: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchpointInfo {
    pub id: i32,
    pub enabled: bool,
    pub hit_count: u32,
    pub address: u64,
    pub size: u32,
    pub read: bool,
    pub write: bool,
}

/// Why a thread is currently stopped, if it is. The `Display` strings
/// ("breakpoint", "signal", …) are also what `stopReason` serializes as
/// on the wire — callers compare against the bare tag, not a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint(i32),
    Watchpoint(i32),
    Signal,
    Exception,
    Step,
    None,
}

impl Serialize for StopReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Breakpoint(_) => write!(f, "breakpoint"),
            StopReason::Watchpoint(_) => write!(f, "watchpoint"),
            StopReason::Signal => write!(f, "signal"),
            StopReason::Exception => write!(f, "exception"),
            StopReason::Step => write!(f, "step"),
            StopReason::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    pub id: u64,
    pub state: ProcessState,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInfo {
    pub index: u32,
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub pc: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub name: String,
    pub path: PathBuf,
    pub load_address: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMatch {
    pub name: String,
    pub address: u64,
    pub symbol_type: String,
    pub module: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub addr: u64,
    pub mnemonic: String,
    pub operands: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_and_crashed_both_count_as_stopped() {
        assert!(ProcessState::Stopped.is_stopped());
        assert!(ProcessState::Crashed.is_stopped());
        assert!(!ProcessState::Running.is_stopped());
    }

    #[test]
    fn stop_reason_display_matches_scenario_substrings() {
        assert_eq!(StopReason::Signal.to_string(), "signal");
        assert_eq!(StopReason::Exception.to_string(), "exception");
        assert_eq!(StopReason::Breakpoint(3).to_string(), "breakpoint");
    }
}
