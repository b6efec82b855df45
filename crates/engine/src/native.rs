// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NativeEngine`: drives a real `lldb` binary as a subprocess.
//!
//! Binding LLDB's C++ API directly would mean `unsafe` FFI, which the
//! workspace forbids outright (`unsafe_code = "forbid"`). Instead this
//! talks to the stock `lldb` command-line driver over its stdin/stdout,
//! the same way a person would at a terminal. The command-interpreter
//! path is a direct fit: we write the line, read back lldb's own echoed
//! output, and hand it back verbatim as a [`CommandOutcome`]. The
//! structured path (restart, threads, registers, memory, …) has no
//! native API to call into, so it issues the read-only LLDB commands
//! that carry the same information and parses their text.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dbg_core::{
    AttachRequest, BreakpointInfo, BreakpointLocation, FrameInfo, Instruction, LaunchParams,
    ModuleInfo, ProcessState, StopReason, SymbolMatch, ThreadInfo, WatchpointInfo,
};
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;

use crate::adapter::{DebugEngine, EngineError, EngineNotification};
use crate::command::CommandOutcome;

const PROMPT: &str = "(lldb) ";

struct Redirection {
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    stdout_offset: u64,
    stderr_offset: u64,
}

struct NativeState {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    /// Everything read from lldb's stdout that hasn't been consumed by a
    /// `run_command` call yet; `run_command` scans this for the next
    /// prompt marker rather than trying to line-buffer mid-read.
    pending_output: String,
    redirection: Option<Redirection>,
    last_known_state: ProcessState,
    selected_thread: u64,
}

impl Default for NativeState {
    fn default() -> Self {
        Self {
            child: None,
            stdin: None,
            pending_output: String::new(),
            redirection: None,
            last_known_state: ProcessState::Invalid,
            selected_thread: 1,
        }
    }
}

pub struct NativeEngine {
    lldb_path: String,
    state: Mutex<NativeState>,
    next_tempfile: AtomicU32,
}

impl NativeEngine {
    /// `lldb_path` lets the daemon point at a specific toolchain install
    /// ("native library search paths") instead of
    /// relying on `$PATH`.
    pub fn new(lldb_path: impl Into<String>) -> Self {
        Self {
            lldb_path: lldb_path.into(),
            state: Mutex::new(NativeState::default()),
            next_tempfile: AtomicU32::new(0),
        }
    }

    async fn ensure_spawned(&self, guard: &mut NativeState) -> Result<(), EngineError> {
        if guard.child.is_some() {
            return Ok(());
        }
        let mut cmd = tokio::process::Command::new(&self.lldb_path);
        cmd.arg("--no-use-colors")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let mut child = cmd.spawn().map_err(|e| EngineError::Unavailable(e.to_string()))?;
        let stdin = child.stdin.take();
        guard.child = Some(child);
        guard.stdin = stdin;
        // Drain the startup banner up to the first prompt.
        self.read_until_prompt(guard, Duration::from_secs(5)).await?;
        Ok(())
    }

    async fn read_until_prompt(
        &self,
        guard: &mut NativeState,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(idx) = guard.pending_output.find(PROMPT) {
                let out: String = guard.pending_output.drain(..idx + PROMPT.len()).collect();
                return Ok(out);
            }
            let Some(child) = guard.child.as_mut() else { return Err(EngineError::Unavailable("lldb not spawned".into())) };
            let Some(stdout) = child.stdout.as_mut() else { return Err(EngineError::Unavailable("lldb stdout closed".into())) };
            let mut buf = [0u8; 4096];
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Failed("timed out waiting for lldb prompt".into()));
            }
            match tokio::time::timeout(remaining, stdout.read(&mut buf)).await {
                Ok(Ok(0)) => return Err(EngineError::Failed("lldb closed stdout".into())),
                Ok(Ok(n)) => guard.pending_output.push_str(&String::from_utf8_lossy(&buf[..n])),
                Ok(Err(e)) => return Err(EngineError::Failed(e.to_string())),
                Err(_) => return Err(EngineError::Failed("timed out waiting for lldb prompt".into())),
            }
        }
    }

    /// Writes one command, waits for the next prompt, and splits the echoed
    /// command line off the front of the captured output.
    async fn run_command(&self, command: &str) -> Result<CommandOutcome, EngineError> {
        let mut guard = self.state.lock().await;
        self.ensure_spawned(&mut guard).await?;
        let stdin = guard.stdin.as_mut().ok_or_else(|| EngineError::Unavailable("lldb stdin closed".into()))?;
        stdin
            .write_all(format!("{command}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Failed(e.to_string()))?;
        let raw = self.read_until_prompt(&mut guard, Duration::from_secs(15)).await?;
        let body = raw.strip_suffix(PROMPT).unwrap_or(&raw);
        let body = body.strip_prefix(command).unwrap_or(body).trim_start_matches('\n');
        Ok(CommandOutcome::ok(body.to_string()))
    }

    fn alloc_tempfile_pair(&self) -> (PathBuf, PathBuf) {
        let n = self.next_tempfile.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir();
        (dir.join(format!("dbg-stdout-{n}.log")), dir.join(format!("dbg-stderr-{n}.log")))
    }
}

#[async_trait]
impl DebugEngine for NativeEngine {
    async fn create_target(
        &self,
        file: &str,
        arch: Option<&str>,
        triple: Option<&str>,
    ) -> Result<(CommandOutcome, String), EngineError> {
        let mut cmd = format!("target create \"{file}\"");
        if let Some(arch) = arch {
            cmd.push_str(&format!(" --arch {arch}"));
        }
        let outcome = self.run_command(&cmd).await?;
        if !outcome.stdout.contains("Current executable") && !outcome.stdout.is_empty() {
            return Err(EngineError::Failed(outcome.stdout));
        }
        let triple_outcome = self.run_command("target list").await?;
        let triple = triple
            .map(str::to_string)
            .or_else(|| parse_triple(&triple_outcome.stdout))
            .unwrap_or_else(|| "unknown".to_string());
        Ok((outcome, triple))
    }

    async fn launch(
        &self,
        params: &LaunchParams,
    ) -> Result<(CommandOutcome, u32, ProcessState), EngineError> {
        let (stdout_path, stderr_path) = self.alloc_tempfile_pair();
        let mut cmd = format!(
            "process launch -o {} -e {}",
            stdout_path.display(),
            stderr_path.display()
        );
        if let Some(cwd) = &params.cwd {
            cmd.push_str(&format!(" --working-dir {}", cwd.display()));
        }
        for (k, v) in &params.env {
            cmd.push_str(&format!(" --environment {k}={v}"));
        }
        if !params.args.is_empty() {
            cmd.push_str(" -- ");
            cmd.push_str(&params.args.join(" "));
        }
        let outcome = self.run_command(&cmd).await?;
        let pid = parse_pid(&outcome.stdout).ok_or_else(|| EngineError::Failed(outcome.stdout.clone()))?;
        let state = parse_process_state(&outcome.stdout).unwrap_or(ProcessState::Running);

        let mut guard = self.state.lock().await;
        guard.redirection = Some(Redirection { stdout_path, stderr_path, stdout_offset: 0, stderr_offset: 0 });
        guard.last_known_state = state;
        Ok((outcome, pid, state))
    }

    async fn attach(
        &self,
        request: &AttachRequest,
    ) -> Result<(CommandOutcome, u32, ProcessState), EngineError> {
        let cmd = match request {
            AttachRequest::Pid(pid) => format!("process attach --pid {pid}"),
            AttachRequest::Name(name) => format!("process attach --name {name}"),
        };
        let outcome = self.run_command(&cmd).await?;
        let pid = parse_pid(&outcome.stdout).ok_or_else(|| EngineError::Failed(outcome.stdout.clone()))?;
        let state = parse_process_state(&outcome.stdout).unwrap_or(ProcessState::Stopped);
        self.state.lock().await.last_known_state = state;
        Ok((outcome, pid, state))
    }

    async fn restart(&self, params: &LaunchParams) -> Result<(u32, ProcessState), EngineError> {
        let _ = self.run_command("process kill").await;
        let (_outcome, pid, state) = self.launch(params).await?;
        Ok((pid, state))
    }

    async fn set_breakpoint(
        &self,
        location: BreakpointLocation<'_>,
    ) -> Result<(CommandOutcome, i32), EngineError> {
        let cmd = match location {
            BreakpointLocation::FileLine { file, line } => format!("breakpoint set --file {file} --line {line}"),
            BreakpointLocation::Symbol(name) => format!("breakpoint set --name {name}"),
            BreakpointLocation::Address(addr) => format!("breakpoint set --address {addr:#x}"),
        };
        let outcome = self.run_command(&cmd).await?;
        let id = parse_breakpoint_id(&outcome.stdout)
            .ok_or_else(|| EngineError::Failed(outcome.stdout.clone()))?;
        Ok((outcome, id))
    }

    async fn delete_breakpoint(&self, id: i32) -> Result<(), EngineError> {
        let outcome = self.run_command(&format!("breakpoint delete {id}")).await?;
        if outcome.stdout.to_lowercase().contains("invalid") {
            return Err(EngineError::NotFound(format!("breakpoint {id}")));
        }
        Ok(())
    }

    async fn list_breakpoints(&self) -> Result<Vec<BreakpointInfo>, EngineError> {
        let outcome = self.run_command("breakpoint list").await?;
        Ok(parse_breakpoint_list(&outcome.stdout))
    }

    async fn update_breakpoint(
        &self,
        id: i32,
        enabled: Option<bool>,
        ignore_count: Option<u32>,
        condition: Option<&str>,
    ) -> Result<BreakpointInfo, EngineError> {
        if let Some(enabled) = enabled {
            let verb = if enabled { "enable" } else { "disable" };
            self.run_command(&format!("breakpoint {verb} {id}")).await?;
        }
        if let Some(ignore_count) = ignore_count {
            self.run_command(&format!("breakpoint modify --ignore-count {ignore_count} {id}")).await?;
        }
        if let Some(condition) = condition {
            self.run_command(&format!("breakpoint modify --condition \"{condition}\" {id}")).await?;
        }
        self.list_breakpoints()
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("breakpoint {id}")))
    }

    async fn set_watchpoint(&self, address: u64, size: u32, read: bool, write: bool) -> Result<i32, EngineError> {
        let mode = match (read, write) {
            (true, true) => "read_write",
            (true, false) => "read",
            (false, true) => "write",
            (false, false) => return Err(EngineError::Failed("watchpoint needs read or write".into())),
        };
        let outcome = self
            .run_command(&format!("watchpoint set expression -w {mode} -s {size} -- {address:#x}"))
            .await?;
        parse_watchpoint_id(&outcome.stdout).ok_or_else(|| EngineError::Failed(outcome.stdout))
    }

    async fn delete_watchpoint(&self, id: i32) -> Result<(), EngineError> {
        let outcome = self.run_command(&format!("watchpoint delete {id}")).await?;
        if outcome.stdout.to_lowercase().contains("invalid") {
            return Err(EngineError::NotFound(format!("watchpoint {id}")));
        }
        Ok(())
    }

    async fn list_watchpoints(&self) -> Result<Vec<WatchpointInfo>, EngineError> {
        let outcome = self.run_command("watchpoint list").await?;
        Ok(parse_watchpoint_list(&outcome.stdout))
    }

    async fn process_state(&self) -> Result<ProcessState, EngineError> {
        let outcome = self.run_command("process status").await?;
        let state = parse_process_state(&outcome.stdout).unwrap_or(ProcessState::Invalid);
        self.state.lock().await.last_known_state = state;
        Ok(state)
    }

    async fn continue_process(&self) -> Result<CommandOutcome, EngineError> {
        self.run_command("process continue").await
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.run_command("process interrupt").await.map(|_| ())
    }

    async fn step_in(&self) -> Result<CommandOutcome, EngineError> {
        self.run_command("thread step-in").await
    }

    async fn step_over(&self) -> Result<CommandOutcome, EngineError> {
        self.run_command("thread step-over").await
    }

    async fn step_out(&self) -> Result<CommandOutcome, EngineError> {
        self.run_command("thread step-out").await
    }

    async fn threads(&self) -> Result<Vec<ThreadInfo>, EngineError> {
        let outcome = self.run_command("thread list").await?;
        let threads = parse_thread_list(&outcome.stdout);
        if threads.is_empty() {
            return Err(EngineError::NoProcess);
        }
        Ok(threads)
    }

    async fn frames(&self, thread_id: u64) -> Result<Vec<FrameInfo>, EngineError> {
        self.run_command(&format!("thread select {thread_id}")).await?;
        let outcome = self.run_command("thread backtrace").await?;
        Ok(parse_backtrace(&outcome.stdout))
    }

    async fn select_thread(&self, thread_id: u64) -> Result<(), EngineError> {
        let outcome = self.run_command(&format!("thread select {thread_id}")).await?;
        if outcome.stdout.to_lowercase().contains("invalid") {
            return Err(EngineError::NoThread);
        }
        self.state.lock().await.selected_thread = thread_id;
        Ok(())
    }

    async fn select_frame(&self, thread_id: u64, frame_index: u32) -> Result<(), EngineError> {
        self.select_thread(thread_id).await?;
        let outcome = self.run_command(&format!("frame select {frame_index}")).await?;
        if outcome.stdout.to_lowercase().contains("invalid") {
            return Err(EngineError::Failed(format!("no frame {frame_index}")));
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        expr: &str,
        frame_index: Option<u32>,
    ) -> Result<(CommandOutcome, Option<String>), EngineError> {
        if let Some(idx) = frame_index {
            self.run_command(&format!("frame select {idx}")).await?;
        }
        let outcome = self.run_command(&format!("expression -- {expr}")).await?;
        let value = parse_expression_value(&outcome.stdout);
        Ok((outcome, value))
    }

    async fn read_registers(&self, thread_id: Option<u64>) -> Result<HashMap<String, String>, EngineError> {
        if let Some(tid) = thread_id {
            self.run_command(&format!("thread select {tid}")).await?;
        }
        let outcome = self.run_command("register read").await?;
        Ok(parse_registers(&outcome.stdout))
    }

    async fn write_register(&self, name: &str, value: &str) -> Result<(), EngineError> {
        let outcome = self.run_command(&format!("register write {name} {value}")).await?;
        if outcome.stdout.to_lowercase().contains("error") {
            return Err(EngineError::Failed(outcome.stdout));
        }
        Ok(())
    }

    async fn disassemble(&self, addr: Option<u64>, count: u32) -> Result<Vec<Instruction>, EngineError> {
        let cmd = match addr {
            Some(addr) => format!("disassemble --start-address {addr:#x} --count {count}"),
            None => format!("disassemble --count {count}"),
        };
        let outcome = self.run_command(&cmd).await?;
        Ok(parse_disassembly(&outcome.stdout))
    }

    async fn list_modules(&self) -> Result<Vec<ModuleInfo>, EngineError> {
        let outcome = self.run_command("image list").await?;
        Ok(parse_module_list(&outcome.stdout))
    }

    async fn search_symbol(&self, pattern: &str, module: Option<&str>) -> Result<Vec<SymbolMatch>, EngineError> {
        let cmd = match module {
            Some(m) => format!("image lookup --regex --symbol {pattern} {m}"),
            None => format!("image lookup --regex --symbol {pattern}"),
        };
        let outcome = self.run_command(&cmd).await?;
        Ok(parse_symbol_matches(&outcome.stdout))
    }

    async fn read_memory(&self, addr: u64, size: usize) -> Result<Vec<u8>, EngineError> {
        let outcome = self
            .run_command(&format!("memory read --format x --size 1 --count {size} {addr:#x}"))
            .await?;
        Ok(parse_memory_bytes(&outcome.stdout))
    }

    async fn write_memory(&self, addr: u64, data: &[u8]) -> Result<usize, EngineError> {
        let hex: Vec<String> = data.iter().map(|b| format!("{b:02x}")).collect();
        let outcome = self.run_command(&format!("memory write {addr:#x} {}", hex.join(" "))).await?;
        if outcome.stdout.to_lowercase().contains("error") {
            return Err(EngineError::Failed(outcome.stdout));
        }
        Ok(data.len())
    }

    async fn command(&self, command: &str) -> Result<CommandOutcome, EngineError> {
        self.run_command(command).await
    }

    async fn poll_notification(&self, timeout: Duration) -> Option<EngineNotification> {
        // No SBListener available without unsafe FFI; poll `process status`
        // text at a cadence bounded by `timeout` and report a transition.
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let current = self.process_state().await.ok()?;
            let changed = {
                let guard = self.state.lock().await;
                guard.last_known_state != current
            };
            if changed {
                return Some(EngineNotification::ProcessStateChanged(current));
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(200).min(timeout)).await;
        }
    }

    async fn drain_stdio(&self) -> (Vec<u8>, Vec<u8>) {
        let mut guard = self.state.lock().await;
        let Some(redir) = guard.redirection.as_mut() else { return (Vec::new(), Vec::new()) };
        let out = read_new_bytes(&redir.stdout_path, &mut redir.stdout_offset, 4096);
        let err = read_new_bytes(&redir.stderr_path, &mut redir.stderr_offset, 4096);
        (out, err)
    }

    async fn shutdown(&self) {
        let _ = self.run_command("process kill").await;
        let _ = self.run_command("quit").await;
        let mut guard = self.state.lock().await;
        if let Some(mut child) = guard.child.take() {
            let _ = child.start_kill();
        }
    }
}

fn read_new_bytes(path: &std::path::Path, offset: &mut u64, max: u64) -> Vec<u8> {
    use std::io::{Read, Seek, SeekFrom};
    let Ok(mut f) = std::fs::File::open(path) else { return Vec::new() };
    if f.seek(SeekFrom::Start(*offset)).is_err() {
        return Vec::new();
    }
    let mut buf = vec![0u8; max as usize];
    let n = f.read(&mut buf).unwrap_or(0);
    buf.truncate(n);
    *offset += n as u64;
    buf
}

fn parse_pid(text: &str) -> Option<u32> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"Process (\d+)").unwrap());
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_triple(text: &str) -> Option<String> {
    text.lines().find_map(|l| l.split_whitespace().find(|w| w.contains('-')).map(str::to_string))
}

fn parse_process_state(text: &str) -> Option<ProcessState> {
    let lower = text.to_lowercase();
    if lower.contains("exited with status") || lower.contains("exited") {
        Some(ProcessState::Exited)
    } else if lower.contains("stop reason = signal") || lower.contains("stop reason = exc") {
        Some(ProcessState::Crashed)
    } else if lower.contains("stopped") {
        Some(ProcessState::Stopped)
    } else if lower.contains("launched") || lower.contains("running") {
        Some(ProcessState::Running)
    } else {
        None
    }
}

fn parse_breakpoint_id(text: &str) -> Option<i32> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"Breakpoint (\d+)").unwrap());
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_watchpoint_id(text: &str) -> Option<i32> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"Watchpoint (\d+)").unwrap());
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_breakpoint_list(text: &str) -> Vec<BreakpointInfo> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^(\d+):.*?(?:resolved, hit count = (\d+))?$").unwrap());
    re.captures_iter(text)
        .filter_map(|c| {
            let id = c.get(1)?.as_str().parse().ok()?;
            let hit_count = c.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            Some(BreakpointInfo { id, enabled: true, hit_count, ignore_count: 0, condition: None })
        })
        .collect()
}

fn parse_watchpoint_list(text: &str) -> Vec<WatchpointInfo> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^Watchpoint (\d+): addr = (0x[0-9a-fA-F]+) size = (\d+) state = (enabled|disabled)").unwrap()
    });
    re.captures_iter(text)
        .filter_map(|c| {
            Some(WatchpointInfo {
                id: c.get(1)?.as_str().parse().ok()?,
                address: u64::from_str_radix(c.get(2)?.as_str().trim_start_matches("0x"), 16).ok()?,
                size: c.get(3)?.as_str().parse().ok()?,
                enabled: c.get(4)?.as_str() == "enabled",
                hit_count: 0,
                read: true,
                write: true,
            })
        })
        .collect()
}

fn parse_thread_list(text: &str) -> Vec<ThreadInfo> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^\*?\s*thread #(\d+):.*?stop reason = (.+)$").unwrap());
    re.captures_iter(text)
        .filter_map(|c| {
            let id = c.get(1)?.as_str().parse().ok()?;
            let reason_text = c.get(2)?.as_str();
            let stop_reason = parse_stop_reason(reason_text);
            Some(ThreadInfo { id, state: ProcessState::Stopped, stop_reason })
        })
        .collect()
}

fn parse_stop_reason(text: &str) -> StopReason {
    let lower = text.to_lowercase();
    if let Some(rest) = lower.strip_prefix("breakpoint ") {
        let id = rest.split('.').next().and_then(|s| s.parse().ok()).unwrap_or(0);
        StopReason::Breakpoint(id)
    } else if let Some(rest) = lower.strip_prefix("watchpoint ") {
        let id = rest.trim().parse().unwrap_or(0);
        StopReason::Watchpoint(id)
    } else if lower.contains("signal") {
        StopReason::Signal
    } else if lower.contains("exception") || lower.contains("exc_bad_access") {
        StopReason::Exception
    } else if lower.contains("step") {
        StopReason::Step
    } else {
        StopReason::None
    }
}

fn parse_backtrace(text: &str) -> Vec<FrameInfo> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*frame #(\d+): (0x[0-9a-fA-F]+) \S+`([\w:]+).*?at ([^:]+):(\d+)").unwrap()
    });
    re.captures_iter(text)
        .filter_map(|c| {
            Some(FrameInfo {
                index: c.get(1)?.as_str().parse().ok()?,
                pc: u64::from_str_radix(c.get(2)?.as_str().trim_start_matches("0x"), 16).ok()?,
                function: c.get(3)?.as_str().to_string(),
                file: Some(c.get(4)?.as_str().to_string()),
                line: c.get(5)?.as_str().parse().ok(),
            })
        })
        .collect()
}

fn parse_expression_value(text: &str) -> Option<String> {
    let trimmed = text.trim();
    trimmed.rsplit_once('=').map(|(_, v)| v.trim().to_string()).or_else(|| {
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    })
}

fn parse_registers(text: &str) -> HashMap<String, String> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^\s*(\w+) = (0x[0-9a-fA-F]+)").unwrap());
    re.captures_iter(text)
        .filter_map(|c| Some((c.get(1)?.as_str().to_string(), c.get(2)?.as_str().to_string())))
        .collect()
}

fn parse_disassembly(text: &str) -> Vec<Instruction> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:->)?\s*(0x[0-9a-fA-F]+)[^:]*:\s+(\w+)\s*(.*)$").unwrap()
    });
    re.captures_iter(text)
        .filter_map(|c| {
            Some(Instruction {
                addr: u64::from_str_radix(c.get(1)?.as_str().trim_start_matches("0x"), 16).ok()?,
                mnemonic: c.get(2)?.as_str().to_string(),
                operands: c.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

fn parse_module_list(text: &str) -> Vec<ModuleInfo> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^\[\s*\d+\]\s+[0-9A-Fa-f]+\s+(0x[0-9a-fA-F]+)\s+(\S+)").unwrap());
    re.captures_iter(text)
        .filter_map(|c| {
            let path = c.get(2)?.as_str();
            Some(ModuleInfo {
                name: PathBuf::from(path).file_name()?.to_string_lossy().to_string(),
                path: PathBuf::from(path),
                load_address: u64::from_str_radix(c.get(1)?.as_str().trim_start_matches("0x"), 16).ok(),
            })
        })
        .collect()
}

fn parse_symbol_matches(text: &str) -> Vec<SymbolMatch> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)Address: \S+`(\S+) \[(0x[0-9a-fA-F]+)\]").unwrap()
    });
    re.captures_iter(text)
        .filter_map(|c| {
            Some(SymbolMatch {
                name: c.get(1)?.as_str().to_string(),
                address: u64::from_str_radix(c.get(2)?.as_str().trim_start_matches("0x"), 16).ok()?,
                symbol_type: "code".to_string(),
                module: None,
            })
        })
        .collect()
}

fn parse_memory_bytes(text: &str) -> Vec<u8> {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"0x[0-9a-fA-F]{2,}").unwrap());
    text.lines()
        .flat_map(|line| {
            line.split(':').nth(1).unwrap_or("").split_whitespace().filter_map(|tok| {
                if re.is_match(tok) {
                    u8::from_str_radix(tok.trim_start_matches("0x"), 16).ok()
                } else {
                    None
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pid_from_launch_output() {
        assert_eq!(parse_pid("Process 4213 launched: '/bin/foo' (x86_64)"), Some(4213));
    }

    #[test]
    fn parses_process_state_variants() {
        assert_eq!(parse_process_state("Process 1 exited with status = 0"), Some(ProcessState::Exited));
        assert_eq!(
            parse_process_state("* thread #1, stop reason = signal SIGSEGV"),
            Some(ProcessState::Crashed)
        );
        assert_eq!(parse_process_state("Process 1 stopped"), Some(ProcessState::Stopped));
    }

    #[test]
    fn parses_stop_reason_kinds() {
        assert_eq!(parse_stop_reason("breakpoint 1.1"), StopReason::Breakpoint(1));
        assert_eq!(parse_stop_reason("signal SIGSEGV"), StopReason::Signal);
        assert_eq!(parse_stop_reason("step over"), StopReason::Step);
    }

    #[test]
    fn parses_breakpoint_id_from_set_output() {
        assert_eq!(parse_breakpoint_id("Breakpoint 3: where = main, address = 0x1000"), Some(3));
    }

    #[test]
    fn parses_registers_block() {
        let text = "General Purpose Registers:\n    rax = 0x0000000000000001\n    rbx = 0x0000000000000002\n";
        let regs = parse_registers(text);
        assert_eq!(regs.get("rax").map(String::as_str), Some("0x0000000000000001"));
        assert_eq!(regs.get("rbx").map(String::as_str), Some("0x0000000000000002"));
    }

    #[test]
    fn parses_disassembly_lines() {
        let text = "   0x1000: nop\n-> 0x1001: mov eax, ebx\n";
        let instrs = parse_disassembly(text);
        assert_eq!(instrs.len(), 2);
        assert_eq!(instrs[1].mnemonic, "mov");
    }
}
