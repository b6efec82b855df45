// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Pump: one task per session, polling the engine
//! for asynchronous notifications and turning them into buffered
//! `Event`s. A state-changed notification triggers a thread scan for
//! breakpoint/watchpoint stop reasons, then a stdout/stderr drain, all
//! best-effort: a single failed step is swallowed, not fatal to the pump.

use std::sync::Arc;
use std::time::Duration;

use dbg_core::{EventData, ProcessState, SessionId, StopReason};
use dbg_engine::EngineNotification;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Session;

const WAIT_TIMEOUT: Duration = Duration::from_secs(1);
/// How long `stop` waits for the pump task to actually exit before giving up.
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn spawn(session: Arc<Session>) -> JoinHandle<()> {
    let cancel = session.pump_cancel.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(session_id = %session.id, "event pump stopping");
                    return;
                }
                notification = session.engine.poll_notification(WAIT_TIMEOUT) => {
                    if let Some(EngineNotification::ProcessStateChanged(state)) = notification {
                        handle_state_change(&session, state).await;
                    }
                    drain_stdio(&session).await;
                }
            }
        }
    })
}

async fn handle_state_change(session: &Session, state: ProcessState) {
    session
        .events
        .push(dbg_core::Event::new(session.id, EventData::ProcessStateChanged { state: state as i32 }))
        .await;

    if !state.is_stopped() {
        return;
    }

    let Ok(threads) = session.engine.threads().await else { return };
    for thread in threads {
        emit_stop_reason(session.id, &session.events, thread.id, thread.stop_reason, session).await;
    }
}

async fn emit_stop_reason(
    session_id: SessionId,
    events: &super::EventBuffer,
    thread_id: u64,
    reason: StopReason,
    session: &Session,
) {
    let frame = session.engine.frames(thread_id).await.ok().and_then(|frames| frames.into_iter().next());
    let (function, file, line) = match frame {
        Some(f) => (f.function, f.file, f.line),
        None => (String::new(), None, None),
    };
    match reason {
        StopReason::Breakpoint(breakpoint_id) => {
            events
                .push(dbg_core::Event::new(
                    session_id,
                    EventData::BreakpointHit { breakpoint_id, thread_id, function, file, line },
                ))
                .await;
        }
        StopReason::Watchpoint(watchpoint_id) => {
            events
                .push(dbg_core::Event::new(
                    session_id,
                    EventData::WatchpointHit { watchpoint_id, thread_id, function, file, line },
                ))
                .await;
        }
        _ => {}
    }
}

async fn drain_stdio(session: &Session) {
    let (out, err) = session.engine.drain_stdio().await;
    if !out.is_empty() {
        session
            .events
            .push(dbg_core::Event::new(
                session.id,
                EventData::Stdout { text: String::from_utf8_lossy(&out).into_owned() },
            ))
            .await;
    }
    if !err.is_empty() {
        session
            .events
            .push(dbg_core::Event::new(
                session.id,
                EventData::Stderr { text: String::from_utf8_lossy(&err).into_owned() },
            ))
            .await;
    }
}

/// Signals the pump task to stop and joins it, bounded by [`JOIN_TIMEOUT`].
/// A timed-out join is logged, not fatal: the task is unreachable after
/// this call either way, since the session it closed over is about to drop.
pub async fn stop(session: &Session) {
    session.pump_cancel.cancel();
    let handle = session.pump_handle.lock().await.take();
    let Some(handle) = handle else { return };
    if tokio::time::timeout(JOIN_TIMEOUT, handle).await.is_err() {
        warn!(session_id = %session.id, "event pump did not stop within {JOIN_TIMEOUT:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TranscriptLog;
    use dbg_engine::SimEngine;

    #[tokio::test]
    async fn pump_surfaces_stdout_from_a_real_child_process() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let engine: Arc<dyn dbg_engine::DebugEngine> = Arc::new(SimEngine::new());
        engine.create_target("/bin/echo", None, None).await.expect("target");
        let session = Arc::new(Session::new(
            SessionId::new(),
            engine.clone(),
            TranscriptLog::new(dir.path().join("t.log")),
        ));

        let params = dbg_core::LaunchParams { args: vec!["hello-pump".into()], ..Default::default() };
        engine.launch(&params).await.expect("launch");

        let handle = spawn(session.clone());
        *session.pump_handle.lock().await = Some(handle);

        let mut saw_stdout = false;
        for _ in 0..50 {
            let drained = session.events.drain(16).await;
            if drained.iter().any(|e| matches!(&e.data, EventData::Stdout { text } if text.contains("hello-pump"))) {
                saw_stdout = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        stop(&session).await;
        assert!(saw_stdout, "event pump never surfaced the child's stdout");
    }
}
