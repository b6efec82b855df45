// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Manager: every RPC method lands here. Owns every live
//! [`Session`], serializing access to each one through its own async
//! mutex rather than a single process-wide lock, and drives the engine
//! through [`dbg_engine::DebugEngine`] instead of calling into LLDB's
//! C API directly.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dbg_core::{
    AttachRequest, BreakpointInfo, BreakpointLocation, DbgError, Event, EventData, FrameInfo,
    Instruction, LaunchParams, ModuleInfo, ProcessState, SessionId, SymbolMatch, ThreadInfo,
    WatchpointInfo,
};
use dbg_engine::{DebugEngine, EngineError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;

use super::{event_pump, Session, TranscriptLog};

/// Maps an engine-level failure onto the RPC error taxonomy. The same
/// `EngineError::NotFound` means "breakpoint not found" in one call site
/// and "watchpoint not found" in another, so the mapping happens at each
/// call site rather than via a single `From` impl.
fn map_process_error(err: EngineError) -> DbgError {
    match err {
        EngineError::Unavailable(msg) => DbgError::engine_unavailable(msg),
        EngineError::NoTarget => DbgError::target_missing("no target bound to this session"),
        EngineError::NoProcess | EngineError::NoThread => {
            DbgError::process_missing("no process bound to this session")
        }
        EngineError::NotFound(what) => DbgError::internal(format!("not found: {what}")),
        EngineError::Failed(msg) => DbgError::internal(msg),
    }
}

pub struct SessionManager {
    config: Config,
    sessions: Mutex<HashMap<SessionId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(config: Config) -> Self {
        Self { config, sessions: Mutex::new(HashMap::new()) }
    }

    fn build_engine(&self) -> Arc<dyn DebugEngine> {
        if self.config.use_simulated_engine {
            Arc::new(dbg_engine::SimEngine::new())
        } else {
            Arc::new(dbg_engine::NativeEngine::new(self.config.lldb_path.clone()))
        }
    }

    pub async fn initialize(&self) -> SessionId {
        let id = SessionId::new();
        let engine = self.build_engine();
        let transcript_path = self.config.log_dir.join(format!("transcript_{id}.log"));
        let session = Arc::new(Session::new(id, engine, TranscriptLog::new(transcript_path)));
        let handle = event_pump::spawn(Arc::clone(&session));
        *session.pump_handle.lock().await = Some(handle);
        self.sessions.lock().await.insert(id, session);
        info!(session_id = %id, "session.created");
        id
    }

    pub async fn terminate(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.sessions.lock().await.remove(&id).ok_or_else(|| DbgError::session_not_found(id))?;
        event_pump::stop(&session).await;
        session.engine.shutdown().await;
        info!(session_id = %id, "session.terminated");
        Ok(())
    }

    pub async fn list_sessions(&self) -> Vec<SessionId> {
        self.sessions.lock().await.keys().copied().collect()
    }

    async fn get(&self, id: SessionId) -> Result<Arc<Session>, DbgError> {
        self.sessions.lock().await.get(&id).cloned().ok_or_else(|| DbgError::session_not_found(id))
    }

    /// Writes the transcript line and enqueues the matching `transcript`
    /// event — every command-interpreter operation does exactly this
    /// after the engine call returns. Returns the text actually written
    /// so the RPC response can carry it (`createTarget`/`launch`/`attach`/
    /// `command` all return a `transcript` field); on a write failure the
    /// RPC still succeeds with an empty transcript, since the transcript
    /// log is a best-effort side effect, not the operation's result.
    async fn record_transcript(&self, session: &Session, command: &str, stdout: &str, stderr: &str) -> String {
        match session.transcript.append(command, stdout, stderr).await {
            Ok(text) => {
                session.events.push(Event::new(session.id, EventData::Transcript { text: text.clone() })).await;
                text
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "failed to write transcript");
                String::new()
            }
        }
    }

    pub async fn create_target(
        &self,
        id: SessionId,
        file: &str,
        arch: Option<&str>,
        triple: Option<&str>,
    ) -> Result<(String, String), DbgError> {
        self.config.check_allowed_root(Path::new(file))?;

        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let (outcome, triple_resolved) = session
            .engine
            .create_target(file, arch, triple)
            .await
            .map_err(map_process_error)?;
        let transcript =
            self.record_transcript(&session, &format!("target create \"{file}\""), &outcome.stdout, &outcome.stderr).await;
        session.events.push(Event::new(id, EventData::TargetCreated { file: file.to_string() })).await;
        Ok((triple_resolved, transcript))
    }

    pub async fn launch(
        &self,
        id: SessionId,
        params: LaunchParams,
    ) -> Result<(u32, ProcessState, String), DbgError> {
        if !self.config.allow_launch {
            return Err(DbgError::launch_not_allowed("launch is disabled by policy"));
        }
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let (outcome, pid, state) =
            session.engine.launch(&params).await.map_err(map_process_error)?;
        *session.last_launch.lock().await = Some(params);
        let transcript = self.record_transcript(&session, "process launch", &outcome.stdout, &outcome.stderr).await;
        session
            .events
            .push(Event::new(id, EventData::ProcessLaunched { pid, state: state as i32 }))
            .await;
        Ok((pid, state, transcript))
    }

    pub async fn attach(
        &self,
        id: SessionId,
        request: AttachRequest,
    ) -> Result<(u32, ProcessState, String), DbgError> {
        if !self.config.allow_attach {
            return Err(DbgError::attach_not_allowed("attach is disabled by policy"));
        }
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let (outcome, pid, state) =
            session.engine.attach(&request).await.map_err(|e| match e {
                EngineError::Failed(msg) => DbgError::attach_failed(msg),
                other => map_process_error(other),
            })?;
        let cmd = match &request {
            AttachRequest::Pid(pid) => format!("process attach --pid {pid}"),
            AttachRequest::Name(name) => format!("process attach --name \"{name}\""),
        };
        let transcript = self.record_transcript(&session, &cmd, &outcome.stdout, &outcome.stderr).await;
        session
            .events
            .push(Event::new(id, EventData::ProcessAttached { pid, state: state as i32 }))
            .await;
        Ok((pid, state, transcript))
    }

    pub async fn restart(&self, id: SessionId) -> Result<(u32, ProcessState), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let params = session.last_launch.lock().await.clone().unwrap_or_default();
        let (pid, state) = session.engine.restart(&params).await.map_err(map_process_error)?;
        Ok((pid, state))
    }

    pub async fn set_breakpoint(
        &self,
        id: SessionId,
        location: BreakpointLocation<'_>,
    ) -> Result<i32, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let (outcome, breakpoint_id) =
            session.engine.set_breakpoint(location).await.map_err(|e| match e {
                EngineError::Failed(msg) => DbgError::breakpoint_error(msg),
                other => map_process_error(other),
            })?;
        let cmd = breakpoint_command(location);
        self.record_transcript(&session, &cmd, &outcome.stdout, &outcome.stderr).await;
        session.events.push(Event::new(id, EventData::BreakpointSet { breakpoint_id })).await;
        Ok(breakpoint_id)
    }

    pub async fn delete_breakpoint(&self, id: SessionId, breakpoint_id: i32) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.delete_breakpoint(breakpoint_id).await.map_err(|e| match e {
            EngineError::NotFound(_) => DbgError::breakpoint_error(format!("breakpoint {breakpoint_id} not found")),
            other => map_process_error(other),
        })
    }

    pub async fn list_breakpoints(&self, id: SessionId) -> Result<Vec<BreakpointInfo>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.list_breakpoints().await.map_err(map_process_error)
    }

    pub async fn update_breakpoint(
        &self,
        id: SessionId,
        breakpoint_id: i32,
        enabled: Option<bool>,
        ignore_count: Option<u32>,
        condition: Option<&str>,
    ) -> Result<BreakpointInfo, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let info = session
            .engine
            .update_breakpoint(breakpoint_id, enabled, ignore_count, condition)
            .await
            .map_err(|e| match e {
                EngineError::NotFound(_) => {
                    DbgError::breakpoint_error(format!("breakpoint {breakpoint_id} not found"))
                }
                other => map_process_error(other),
            })?;
        session
            .events
            .push(Event::new(
                id,
                EventData::BreakpointUpdated {
                    breakpoint_id: info.id,
                    enabled: info.enabled,
                    ignore_count: info.ignore_count,
                    condition: info.condition.clone(),
                },
            ))
            .await;
        Ok(info)
    }

    pub async fn set_watchpoint(
        &self,
        id: SessionId,
        address: u64,
        size: u32,
        read: bool,
        write: bool,
    ) -> Result<i32, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let watchpoint_id = session.engine.set_watchpoint(address, size, read, write).await.map_err(|e| match e {
            EngineError::Failed(msg) => DbgError::watchpoint_error(msg),
            other => map_process_error(other),
        })?;
        session
            .events
            .push(Event::new(id, EventData::WatchpointSet { watchpoint_id, read, write, size }))
            .await;
        Ok(watchpoint_id)
    }

    pub async fn delete_watchpoint(&self, id: SessionId, watchpoint_id: i32) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.delete_watchpoint(watchpoint_id).await.map_err(|e| match e {
            EngineError::NotFound(_) => DbgError::watchpoint_error(format!("watchpoint {watchpoint_id} not found")),
            other => map_process_error(other),
        })?;
        session.events.push(Event::new(id, EventData::WatchpointDeleted { watchpoint_id })).await;
        Ok(())
    }

    pub async fn list_watchpoints(&self, id: SessionId) -> Result<Vec<WatchpointInfo>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.list_watchpoints().await.map_err(map_process_error)
    }

    /// `continue` on an already-running process is not an error (spec
    /// §4.1 tie-break): it returns `ok=true` with a transcript note
    /// instead of issuing `process continue` a second time.
    pub async fn continue_process(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let state = session.engine.process_state().await.map_err(map_process_error)?;
        if !state.is_stopped() {
            self.record_transcript(&session, "process continue", "", "process is already running\n").await;
            return Ok(());
        }
        let outcome = session.engine.continue_process().await.map_err(map_process_error)?;
        self.record_transcript(&session, "process continue", &outcome.stdout, &outcome.stderr).await;
        Ok(())
    }

    pub async fn pause(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.pause().await.map_err(map_process_error)
    }

    pub async fn step_in(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let outcome = session.engine.step_in().await.map_err(map_process_error)?;
        self.record_transcript(&session, "thread step-in", &outcome.stdout, &outcome.stderr).await;
        Ok(())
    }

    pub async fn step_over(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let outcome = session.engine.step_over().await.map_err(map_process_error)?;
        self.record_transcript(&session, "thread step-over", &outcome.stdout, &outcome.stderr).await;
        Ok(())
    }

    pub async fn step_out(&self, id: SessionId) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let outcome = session.engine.step_out().await.map_err(map_process_error)?;
        self.record_transcript(&session, "thread step-out", &outcome.stdout, &outcome.stderr).await;
        Ok(())
    }

    pub async fn threads(&self, id: SessionId) -> Result<Vec<ThreadInfo>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.threads().await.map_err(map_process_error)
    }

    pub async fn frames(&self, id: SessionId, thread_id: u64) -> Result<Vec<FrameInfo>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.frames(thread_id).await.map_err(map_process_error)
    }

    pub async fn select_thread(&self, id: SessionId, thread_id: u64) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.select_thread(thread_id).await.map_err(map_process_error)
    }

    pub async fn select_frame(&self, id: SessionId, thread_id: u64, frame_index: u32) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.select_frame(thread_id, frame_index).await.map_err(map_process_error)
    }

    pub async fn evaluate(
        &self,
        id: SessionId,
        expr: &str,
        frame_index: Option<u32>,
    ) -> Result<Option<String>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let (outcome, value) =
            session.engine.evaluate(expr, frame_index).await.map_err(map_process_error)?;
        self.record_transcript(&session, &format!("expr {expr}"), &outcome.stdout, &outcome.stderr).await;
        Ok(value)
    }

    pub async fn read_registers(
        &self,
        id: SessionId,
        thread_id: Option<u64>,
    ) -> Result<HashMap<String, String>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.read_registers(thread_id).await.map_err(map_process_error)
    }

    pub async fn write_register(&self, id: SessionId, name: &str, value: &str) -> Result<(), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.write_register(name, value).await.map_err(map_process_error)
    }

    pub async fn disassemble(
        &self,
        id: SessionId,
        addr: Option<u64>,
        count: u32,
    ) -> Result<Vec<Instruction>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.disassemble(addr, count).await.map_err(map_process_error)
    }

    pub async fn list_modules(&self, id: SessionId) -> Result<Vec<ModuleInfo>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.list_modules().await.map_err(map_process_error)
    }

    pub async fn search_symbol(
        &self,
        id: SessionId,
        pattern: &str,
        module: Option<&str>,
    ) -> Result<Vec<SymbolMatch>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session.engine.search_symbol(pattern, module).await.map_err(map_process_error)
    }

    /// A short read is not itself an error; the caller gets back exactly
    /// what the engine could read.
    pub async fn read_memory(&self, id: SessionId, addr: u64, size: usize) -> Result<Vec<u8>, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session
            .engine
            .read_memory(addr, size)
            .await
            .map_err(|e| DbgError::memory_access_failed(map_process_error(e).message))
    }

    pub async fn write_memory(&self, id: SessionId, addr: u64, data: &[u8]) -> Result<usize, DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        session
            .engine
            .write_memory(addr, data)
            .await
            .map_err(|e| DbgError::memory_access_failed(map_process_error(e).message))
    }

    pub async fn command(
        &self,
        id: SessionId,
        command: &str,
    ) -> Result<(bool, String, String, String), DbgError> {
        let session = self.get(id).await?;
        let _guard = session.lock.lock().await;
        let outcome = session.engine.command(command).await.map_err(map_process_error)?;
        let transcript = self.record_transcript(&session, command, &outcome.stdout, &outcome.stderr).await;
        Ok((outcome.succeeded, outcome.stdout, outcome.stderr, transcript))
    }

    pub async fn poll_events(&self, id: SessionId, limit: usize) -> Result<Vec<Event>, DbgError> {
        let session = self.get(id).await?;
        Ok(session.events.drain(limit).await)
    }
}

fn breakpoint_command(location: BreakpointLocation<'_>) -> String {
    match location {
        BreakpointLocation::FileLine { file, line } => format!("breakpoint set --file \"{file}\" --line {line}"),
        BreakpointLocation::Symbol(name) => format!("breakpoint set --name \"{name}\""),
        BreakpointLocation::Address(addr) => format!("breakpoint set --address {addr}"),
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
