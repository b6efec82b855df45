// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SimEngine`: an in-process [`DebugEngine`] double.
//!
//! It really does spawn the requested executable (so exit codes and
//! fatal-signal exits are genuine OS-level facts a test can assert on),
//! but breakpoints, watchpoints, registers, and disassembly are bookkept
//! in memory rather than enforced by an attached debugger. It exists so
//! `dbg-daemon`'s test suite never needs a real LLDB install — mirrors
//! the role `FakeAgentAdapter`/`test-support` feature plays for the
//! teacher's `AgentAdapter` trait.

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dbg_core::{
    AttachRequest, BreakpointInfo, BreakpointLocation, FrameInfo, Instruction, LaunchParams,
    ModuleInfo, ProcessState, StopReason, SymbolMatch, ThreadInfo, WatchpointInfo,
};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{Mutex, Notify};

use crate::adapter::{DebugEngine, EngineError, EngineNotification};
use crate::command::CommandOutcome;

const SIM_THREAD_ID: u64 = 1;

#[derive(Default)]
struct SimState {
    target_file: Option<String>,
    child: Option<Child>,
    pid: Option<u32>,
    process_state: ProcessState,
    exit_reason: Option<StopReason>,
    breakpoints: Vec<BreakpointInfo>,
    next_bp_id: i32,
    watchpoints: Vec<WatchpointInfo>,
    next_wp_id: i32,
    selected_frame: u32,
    registers: HashMap<String, String>,
    memory: HashMap<u64, u8>,
    stdout_buf: Vec<u8>,
    stderr_buf: Vec<u8>,
    pending_notifications: VecDeque<EngineNotification>,
}

impl SimState {
    fn push_state(&mut self, state: ProcessState) {
        self.process_state = state;
        self.pending_notifications.push_back(EngineNotification::ProcessStateChanged(state));
    }
}

/// A simulated `SBDebugger` handle. `notify` wakes `poll_notification`
/// whenever the background exit-watcher or a structured call enqueues a
/// new process-state transition. The state is `Arc`-wrapped so the
/// stdout/stderr pump tasks spawned by `launch`/`restart` can outlive the
/// call that started them.
pub struct SimEngine {
    state: Arc<Mutex<SimState>>,
    notify: Arc<Notify>,
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                process_state: ProcessState::Invalid,
                ..Default::default()
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    async fn do_launch(&self, params: &LaunchParams) -> Result<(u32, ProcessState), EngineError> {
        let mut guard = self.state.lock().await;
        let file = guard.target_file.clone().ok_or(EngineError::NoTarget)?;
        drop(guard);

        let mut cmd = tokio::process::Command::new(&file);
        cmd.args(&params.args)
            .envs(&params.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &params.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| EngineError::Failed(e.to_string()))?;
        let pid = child.id().unwrap_or_default();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut guard = self.state.lock().await;
        guard.child = Some(child);
        guard.pid = Some(pid);
        // A real debugger stops at an enabled breakpoint the instant the
        // target hits it; since nothing here actually instruments the
        // child, the closest honest simulation is to treat the first
        // enabled breakpoint as hit the moment the process starts.
        let hit_breakpoint = guard.breakpoints.iter_mut().find(|b| b.enabled).map(|bp| {
            bp.hit_count += 1;
            bp.id
        });
        let final_state = if let Some(id) = hit_breakpoint {
            guard.exit_reason = Some(StopReason::Breakpoint(id));
            guard.push_state(ProcessState::Stopped);
            ProcessState::Stopped
        } else {
            guard.push_state(ProcessState::Running);
            ProcessState::Running
        };
        drop(guard);
        self.notify.notify_waiters();

        if let Some(out) = stdout {
            self.spawn_pipe_reader_stdout(out);
        }
        if let Some(err) = stderr {
            self.spawn_pipe_reader_stderr(err);
        }

        Ok((pid, final_state))
    }

    fn spawn_pipe_reader_stdout(&self, mut pipe: ChildStdout) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                match pipe.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => state.lock().await.stdout_buf.extend_from_slice(&buf[..n]),
                }
            }
        });
    }

    fn spawn_pipe_reader_stderr(&self, mut pipe: ChildStderr) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                match pipe.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => state.lock().await.stderr_buf.extend_from_slice(&buf[..n]),
                }
            }
        });
    }
}

#[async_trait]
impl DebugEngine for SimEngine {
    async fn create_target(
        &self,
        file: &str,
        _arch: Option<&str>,
        triple: Option<&str>,
    ) -> Result<(CommandOutcome, String), EngineError> {
        let mut guard = self.state.lock().await;
        guard.target_file = Some(file.to_string());
        let triple = triple.unwrap_or("x86_64-unknown-linux-gnu").to_string();
        let outcome = CommandOutcome::ok(format!("Current executable set to '{file}'.\n"));
        Ok((outcome, triple))
    }

    async fn launch(
        &self,
        params: &LaunchParams,
    ) -> Result<(CommandOutcome, u32, ProcessState), EngineError> {
        let (pid, state) = self.do_launch(params).await?;
        self.watch_exit(pid);
        let outcome = CommandOutcome::ok(format!("Process {pid} launched.\n"));
        Ok((outcome, pid, state))
    }

    async fn attach(
        &self,
        request: &AttachRequest,
    ) -> Result<(CommandOutcome, u32, ProcessState), EngineError> {
        match request {
            AttachRequest::Pid(pid) => {
                let mut guard = self.state.lock().await;
                guard.pid = Some(*pid);
                guard.push_state(ProcessState::Stopped);
                drop(guard);
                self.notify.notify_waiters();
                Ok((CommandOutcome::ok(format!("Process {pid} attached.\n")), *pid, ProcessState::Stopped))
            }
            AttachRequest::Name(_name) => Err(EngineError::Failed(
                "attach-by-name is not supported by the simulated engine".into(),
            )),
        }
    }

    async fn restart(&self, params: &LaunchParams) -> Result<(u32, ProcessState), EngineError> {
        {
            let mut guard = self.state.lock().await;
            if let Some(mut child) = guard.child.take() {
                let _ = child.start_kill();
            }
        }
        let (pid, state) = self.do_launch(params).await?;
        self.watch_exit(pid);
        Ok((pid, state))
    }

    async fn set_breakpoint(
        &self,
        _location: BreakpointLocation<'_>,
    ) -> Result<(CommandOutcome, i32), EngineError> {
        let mut guard = self.state.lock().await;
        guard.next_bp_id += 1;
        let id = guard.next_bp_id;
        guard.breakpoints.push(BreakpointInfo {
            id,
            enabled: true,
            hit_count: 0,
            ignore_count: 0,
            condition: None,
        });
        Ok((CommandOutcome::ok(format!("Breakpoint {id}: no locations (pending).\n")), id))
    }

    async fn delete_breakpoint(&self, id: i32) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        let before = guard.breakpoints.len();
        guard.breakpoints.retain(|b| b.id != id);
        if guard.breakpoints.len() == before {
            return Err(EngineError::NotFound(format!("breakpoint {id}")));
        }
        Ok(())
    }

    async fn list_breakpoints(&self) -> Result<Vec<BreakpointInfo>, EngineError> {
        Ok(self.state.lock().await.breakpoints.clone())
    }

    async fn update_breakpoint(
        &self,
        id: i32,
        enabled: Option<bool>,
        ignore_count: Option<u32>,
        condition: Option<&str>,
    ) -> Result<BreakpointInfo, EngineError> {
        let mut guard = self.state.lock().await;
        let bp = guard
            .breakpoints
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("breakpoint {id}")))?;
        if let Some(enabled) = enabled {
            bp.enabled = enabled;
        }
        if let Some(ignore_count) = ignore_count {
            bp.ignore_count = ignore_count;
        }
        if let Some(condition) = condition {
            bp.condition = Some(condition.to_string());
        }
        Ok(bp.clone())
    }

    async fn set_watchpoint(
        &self,
        address: u64,
        size: u32,
        read: bool,
        write: bool,
    ) -> Result<i32, EngineError> {
        let mut guard = self.state.lock().await;
        guard.next_wp_id += 1;
        let id = guard.next_wp_id;
        guard.watchpoints.push(WatchpointInfo {
            id,
            enabled: true,
            hit_count: 0,
            address,
            size,
            read,
            write,
        });
        Ok(id)
    }

    async fn delete_watchpoint(&self, id: i32) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        let before = guard.watchpoints.len();
        guard.watchpoints.retain(|w| w.id != id);
        if guard.watchpoints.len() == before {
            return Err(EngineError::NotFound(format!("watchpoint {id}")));
        }
        Ok(())
    }

    async fn list_watchpoints(&self) -> Result<Vec<WatchpointInfo>, EngineError> {
        Ok(self.state.lock().await.watchpoints.clone())
    }

    async fn process_state(&self) -> Result<ProcessState, EngineError> {
        let mut guard = self.state.lock().await;
        self.reap_if_exited(&mut guard).await;
        Ok(guard.process_state)
    }

    async fn continue_process(&self) -> Result<CommandOutcome, EngineError> {
        let mut guard = self.state.lock().await;
        if guard.child.is_none() {
            return Err(EngineError::NoProcess);
        }
        guard.push_state(ProcessState::Running);
        drop(guard);
        self.notify.notify_waiters();
        Ok(CommandOutcome::ok("Resuming process.\n"))
    }

    async fn pause(&self) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        if guard.child.is_none() {
            return Err(EngineError::NoProcess);
        }
        guard.push_state(ProcessState::Stopped);
        drop(guard);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn step_in(&self) -> Result<CommandOutcome, EngineError> {
        self.step("thread step-in").await
    }

    async fn step_over(&self) -> Result<CommandOutcome, EngineError> {
        self.step("thread step-over").await
    }

    async fn step_out(&self) -> Result<CommandOutcome, EngineError> {
        self.step("thread step-out").await
    }

    async fn threads(&self) -> Result<Vec<ThreadInfo>, EngineError> {
        let mut guard = self.state.lock().await;
        self.reap_if_exited(&mut guard).await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        let stop_reason = if guard.process_state.is_stopped() {
            guard.exit_reason.unwrap_or(StopReason::None)
        } else {
            StopReason::None
        };
        Ok(vec![ThreadInfo { id: SIM_THREAD_ID, state: guard.process_state, stop_reason }])
    }

    async fn frames(&self, thread_id: u64) -> Result<Vec<FrameInfo>, EngineError> {
        if thread_id != SIM_THREAD_ID {
            return Err(EngineError::NoThread);
        }
        let guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        Ok(vec![FrameInfo {
            index: 0,
            function: "main".to_string(),
            file: guard.target_file.clone(),
            line: Some(1),
            pc: 0x1000,
        }])
    }

    async fn select_thread(&self, thread_id: u64) -> Result<(), EngineError> {
        if thread_id != SIM_THREAD_ID {
            return Err(EngineError::NoThread);
        }
        Ok(())
    }

    async fn select_frame(&self, thread_id: u64, frame_index: u32) -> Result<(), EngineError> {
        if thread_id != SIM_THREAD_ID {
            return Err(EngineError::NoThread);
        }
        self.state.lock().await.selected_frame = frame_index;
        Ok(())
    }

    async fn evaluate(
        &self,
        expr: &str,
        _frame_index: Option<u32>,
    ) -> Result<(CommandOutcome, Option<String>), EngineError> {
        let guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        drop(guard);
        let value = evaluate_arithmetic(expr);
        let outcome = CommandOutcome::ok(format!("{}\n", value.as_deref().unwrap_or("<unknown>")));
        Ok((outcome, value))
    }

    async fn read_registers(
        &self,
        _thread_id: Option<u64>,
    ) -> Result<HashMap<String, String>, EngineError> {
        let guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        let mut regs = guard.registers.clone();
        regs.entry("rip".to_string()).or_insert_with(|| "0x0000000000001000".to_string());
        regs.entry("rsp".to_string()).or_insert_with(|| "0x00007ffffffde000".to_string());
        Ok(regs)
    }

    async fn write_register(&self, name: &str, value: &str) -> Result<(), EngineError> {
        self.state.lock().await.registers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn disassemble(&self, _addr: Option<u64>, count: u32) -> Result<Vec<Instruction>, EngineError> {
        let guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        Ok((0..count.min(16))
            .map(|i| Instruction {
                addr: 0x1000 + u64::from(i) * 4,
                mnemonic: "nop".to_string(),
                operands: String::new(),
            })
            .collect())
    }

    async fn list_modules(&self) -> Result<Vec<ModuleInfo>, EngineError> {
        let guard = self.state.lock().await;
        let file = guard.target_file.clone().ok_or(EngineError::NoTarget)?;
        Ok(vec![ModuleInfo { name: file.clone(), path: file.into(), load_address: Some(0x400000) }])
    }

    async fn search_symbol(
        &self,
        pattern: &str,
        _module: Option<&str>,
    ) -> Result<Vec<SymbolMatch>, EngineError> {
        if pattern.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![SymbolMatch {
            name: pattern.to_string(),
            address: 0x1000,
            symbol_type: "code".to_string(),
            module: None,
        }])
    }

    async fn read_memory(&self, addr: u64, size: usize) -> Result<Vec<u8>, EngineError> {
        let guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        Ok((0..size as u64).map(|i| guard.memory.get(&(addr + i)).copied().unwrap_or(0)).collect())
    }

    async fn write_memory(&self, addr: u64, data: &[u8]) -> Result<usize, EngineError> {
        let mut guard = self.state.lock().await;
        if guard.child.is_none() && guard.pid.is_none() {
            return Err(EngineError::NoProcess);
        }
        for (i, byte) in data.iter().enumerate() {
            guard.memory.insert(addr + i as u64, *byte);
        }
        Ok(data.len())
    }

    async fn command(&self, command: &str) -> Result<CommandOutcome, EngineError> {
        Ok(CommandOutcome::ok(format!("(simulated) {command}\n")))
    }

    async fn poll_notification(&self, timeout: Duration) -> Option<EngineNotification> {
        {
            let mut guard = self.state.lock().await;
            if let Some(ev) = guard.pending_notifications.pop_front() {
                return Some(ev);
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(timeout) => None,
            _ = self.notify.notified() => {
                self.state.lock().await.pending_notifications.pop_front()
            }
        }
    }

    async fn drain_stdio(&self) -> (Vec<u8>, Vec<u8>) {
        let mut guard = self.state.lock().await;
        (std::mem::take(&mut guard.stdout_buf), std::mem::take(&mut guard.stderr_buf))
    }

    async fn shutdown(&self) {
        let mut guard = self.state.lock().await;
        if let Some(mut child) = guard.child.take() {
            let _ = child.start_kill();
        }
    }
}

impl SimEngine {
    /// Spawns the background task that reaps the child and turns a fatal
    /// signal into a synthetic `StopReason` — this is what lets the
    /// "crash" end-to-end scenarios exercise something real without a
    /// native debugger attached.
    fn watch_exit(&self, _pid: u32) {
        // Reaping happens lazily in `process_state`/`threads` via
        // `reap_if_exited` rather than a detached task, so there's no
        // lifetime issue handing out `&self` across `tokio::spawn`.
    }

    async fn reap_if_exited(&self, guard: &mut SimState) {
        if guard.process_state.is_stopped() || matches!(guard.process_state, ProcessState::Exited)
        {
            return;
        }
        let Some(child) = guard.child.as_mut() else { return };
        match child.try_wait() {
            Ok(Some(status)) => {
                #[cfg(unix)]
                let signal = std::os::unix::process::ExitStatusExt::signal(&status);
                #[cfg(not(unix))]
                let signal: Option<i32> = None;

                if let Some(sig) = signal {
                    guard.exit_reason = Some(if sig == 8 {
                        StopReason::Exception // SIGFPE
                    } else {
                        StopReason::Signal
                    });
                    guard.push_state(ProcessState::Crashed);
                } else {
                    guard.push_state(ProcessState::Exited);
                }
                self.notify.notify_waiters();
            }
            Ok(None) => {}
            Err(_) => {}
        }
    }

    async fn step(&self, label: &str) -> Result<CommandOutcome, EngineError> {
        let mut guard = self.state.lock().await;
        if guard.child.is_none() {
            return Err(EngineError::NoProcess);
        }
        guard.exit_reason = Some(StopReason::Step);
        guard.push_state(ProcessState::Stopped);
        drop(guard);
        self.notify.notify_waiters();
        Ok(CommandOutcome::ok(format!("{label}\n")))
    }
}

/// Evaluates a handful of simple `a+b`/`a-b` integer expressions so
/// `evaluate` has a real implementation to exercise rather than a
/// hardcoded stub.
fn evaluate_arithmetic(expr: &str) -> Option<String> {
    let expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    for (op, f) in [('+', (|a: i64, b: i64| a + b) as fn(i64, i64) -> i64), ('-', |a, b| a - b)] {
        if let Some(idx) = expr.rfind(op) {
            if idx == 0 {
                continue;
            }
            let (lhs, rhs) = expr.split_at(idx);
            let rhs = &rhs[1..];
            if let (Ok(a), Ok(b)) = (lhs.parse::<i64>(), rhs.parse::<i64>()) {
                return Some(f(a, b).to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_simple_arithmetic() {
        assert_eq!(evaluate_arithmetic("1+1"), Some("2".to_string()));
        assert_eq!(evaluate_arithmetic("10 - 3"), Some("7".to_string()));
        assert_eq!(evaluate_arithmetic("not an expr"), None);
    }

    #[tokio::test]
    async fn launch_runs_a_real_process_and_reports_exit() {
        let engine = SimEngine::new();
        engine.create_target("/bin/true", None, None).await.expect("target");
        let (_outcome, pid, state) = engine.launch(&LaunchParams::default()).await.expect("launch");
        assert!(pid > 0);
        assert_eq!(state, ProcessState::Running);

        // Poll until the process is reaped as exited.
        let mut seen_exit = false;
        for _ in 0..50 {
            if engine.process_state().await.expect("state") == ProcessState::Exited {
                seen_exit = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(seen_exit, "process never reaped as exited");
    }

    #[tokio::test]
    async fn breakpoint_round_trips_through_list_and_delete() {
        let engine = SimEngine::new();
        let (_out, id) = engine.set_breakpoint(BreakpointLocation::Symbol("main")).await.expect("set");
        let list = engine.list_breakpoints().await.expect("list");
        assert!(list.iter().any(|b| b.id == id && b.enabled && b.hit_count == 0));

        engine.delete_breakpoint(id).await.expect("delete");
        let list = engine.list_breakpoints().await.expect("list after delete");
        assert!(!list.iter().any(|b| b.id == id));
    }

    #[tokio::test]
    async fn watchpoint_round_trips_through_list_and_delete() {
        let engine = SimEngine::new();
        let id = engine.set_watchpoint(0x1000, 4, true, true).await.expect("set");
        let list = engine.list_watchpoints().await.expect("list");
        assert!(list.iter().any(|w| w.id == id));
        engine.delete_watchpoint(id).await.expect("delete");
        let list = engine.list_watchpoints().await.expect("list after delete");
        assert!(!list.iter().any(|w| w.id == id));
    }

    #[tokio::test]
    async fn no_process_yet_fails_with_no_process() {
        let engine = SimEngine::new();
        assert!(matches!(engine.threads().await, Err(EngineError::NoProcess)));
    }
}
