// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `DebugEngine` capability set.
//!
//! Two families of operation:
//! - *command-interpreter* methods return a [`CommandOutcome`] so the
//!   caller can write a faithful transcript line; used for target/launch/
//!   breakpoint/step/evaluate/raw-command, where the caller should see
//!   exactly what an interactive user would at the `lldb` prompt.
//! - *structured* methods return typed data or [`EngineError`] directly;
//!   used for restart, watchpoints, memory, registers, inspection and
//!   anything else where a transcript isn't the primary product.

use std::collections::HashMap;

use async_trait::async_trait;
use dbg_core::{
    AttachRequest, BreakpointInfo, BreakpointLocation, FrameInfo, Instruction, LaunchParams,
    ModuleInfo, ProcessState, SymbolMatch, ThreadInfo, WatchpointInfo,
};
use thiserror::Error;

/// Engine-level failure, independent of the RPC-facing [`dbg_core::DbgError`]
/// taxonomy. `dbg-daemon` maps these onto RPC error codes at the Session
/// Manager boundary, since the same `EngineError::NotFound` means
/// "breakpoint not found" in one call and "target not found" in another.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("no target bound")]
    NoTarget,
    #[error("no process bound")]
    NoProcess,
    #[error("thread not found")]
    NoThread,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("operation failed: {0}")]
    Failed(String),
}

/// A notification the Event Pump receives from the engine's asynchronous
/// side. Thread-level detail (breakpoint/watchpoint hits) is derived by
/// the pump itself via [`DebugEngine::threads`], not carried on the
/// notification — the pump scans all threads after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineNotification {
    ProcessStateChanged(ProcessState),
}

#[async_trait]
pub trait DebugEngine: Send + Sync {
    /// `target create "<file>"` (`createTarget`).
    async fn create_target(
        &self,
        file: &str,
        arch: Option<&str>,
        triple: Option<&str>,
    ) -> Result<(super::CommandOutcome, String), EngineError>;

    /// `process launch -- <args…>` (`launch`).
    async fn launch(
        &self,
        params: &LaunchParams,
    ) -> Result<(super::CommandOutcome, u32, ProcessState), EngineError>;

    /// `process attach --pid/--name` (`attach`).
    async fn attach(
        &self,
        request: &AttachRequest,
    ) -> Result<(super::CommandOutcome, u32, ProcessState), EngineError>;

    /// Kill-then-relaunch through the structured launch-info API, not the
    /// command interpreter, so `restart` carries no transcript.
    async fn restart(&self, params: &LaunchParams) -> Result<(u32, ProcessState), EngineError>;

    async fn set_breakpoint(
        &self,
        location: BreakpointLocation<'_>,
    ) -> Result<(super::CommandOutcome, i32), EngineError>;
    async fn delete_breakpoint(&self, id: i32) -> Result<(), EngineError>;
    async fn list_breakpoints(&self) -> Result<Vec<BreakpointInfo>, EngineError>;
    async fn update_breakpoint(
        &self,
        id: i32,
        enabled: Option<bool>,
        ignore_count: Option<u32>,
        condition: Option<&str>,
    ) -> Result<BreakpointInfo, EngineError>;

    async fn set_watchpoint(
        &self,
        address: u64,
        size: u32,
        read: bool,
        write: bool,
    ) -> Result<i32, EngineError>;
    async fn delete_watchpoint(&self, id: i32) -> Result<(), EngineError>;
    async fn list_watchpoints(&self) -> Result<Vec<WatchpointInfo>, EngineError>;

    /// Current process state without issuing any command — used by the
    /// Session Manager to implement `continue`'s "already running" tie-break
    /// without a transcript side effect.
    async fn process_state(&self) -> Result<ProcessState, EngineError>;

    async fn continue_process(&self) -> Result<super::CommandOutcome, EngineError>;
    async fn pause(&self) -> Result<(), EngineError>;
    async fn step_in(&self) -> Result<super::CommandOutcome, EngineError>;
    async fn step_over(&self) -> Result<super::CommandOutcome, EngineError>;
    async fn step_out(&self) -> Result<super::CommandOutcome, EngineError>;

    async fn threads(&self) -> Result<Vec<ThreadInfo>, EngineError>;
    async fn frames(&self, thread_id: u64) -> Result<Vec<FrameInfo>, EngineError>;
    async fn select_thread(&self, thread_id: u64) -> Result<(), EngineError>;
    async fn select_frame(&self, thread_id: u64, frame_index: u32) -> Result<(), EngineError>;

    async fn evaluate(
        &self,
        expr: &str,
        frame_index: Option<u32>,
    ) -> Result<(super::CommandOutcome, Option<String>), EngineError>;

    async fn read_registers(&self, thread_id: Option<u64>) -> Result<HashMap<String, String>, EngineError>;
    async fn write_register(&self, name: &str, value: &str) -> Result<(), EngineError>;

    /// `addr = None` uses the selected frame's PC (`disassemble`).
    async fn disassemble(&self, addr: Option<u64>, count: u32) -> Result<Vec<Instruction>, EngineError>;

    async fn list_modules(&self) -> Result<Vec<ModuleInfo>, EngineError>;
    async fn search_symbol(
        &self,
        pattern: &str,
        module: Option<&str>,
    ) -> Result<Vec<SymbolMatch>, EngineError>;

    /// Returns the actually-read prefix; a short read is not itself an
    /// error.
    async fn read_memory(&self, addr: u64, size: usize) -> Result<Vec<u8>, EngineError>;
    async fn write_memory(&self, addr: u64, data: &[u8]) -> Result<usize, EngineError>;

    /// Raw passthrough to the command interpreter (`command`).
    async fn command(&self, command: &str) -> Result<super::CommandOutcome, EngineError>;

    /// Blocks up to `timeout` for the next asynchronous notification; `None`
    /// on timeout.
    async fn poll_notification(
        &self,
        timeout: std::time::Duration,
    ) -> Option<EngineNotification>;

    /// Non-blocking drain of up to 4 KiB each of the inferior's stdout and
    /// stderr.
    async fn drain_stdio(&self) -> (Vec<u8>, Vec<u8>);

    /// Tear down process → target → debugger, in that order. Best-effort:
    /// individual failures are swallowed by the caller, not here.
    async fn shutdown(&self);
}
