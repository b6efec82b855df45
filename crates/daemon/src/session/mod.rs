// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state and the Session Manager.

mod event_buffer;
mod event_pump;
pub mod manager;
mod transcript;

pub use event_buffer::EventBuffer;
pub use manager::SessionManager;
pub use transcript::TranscriptLog;

use std::sync::Arc;

use dbg_core::{LaunchParams, SessionId};
use dbg_engine::DebugEngine;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything the Session Manager owns for one live debugging session:
/// engine/target/process handles, breakpoints, recent output, a log
/// path. The engine itself tracks breakpoint and watchpoint bookkeeping;
/// this struct holds the parts that live above the Engine Adapter
/// boundary — the serializing lock, the transcript, the buffered events,
/// and the Event Pump's lifecycle handle.
pub struct Session {
    pub id: SessionId,
    pub engine: Arc<dyn DebugEngine>,
    /// Serializes every engine-touching operation for this session.
    /// Handler code never re-enters this lock from within an
    /// already-locked call, so a plain non-reentrant `tokio::sync::Mutex`
    /// satisfies the mutual-exclusion invariant without the footguns of
    /// a real recursive lock held across `.await`.
    pub lock: AsyncMutex<()>,
    pub transcript: TranscriptLog,
    pub events: EventBuffer,
    pub last_launch: AsyncMutex<Option<LaunchParams>>,
    pub pump_cancel: CancellationToken,
    /// Set by [`event_pump::spawn`] right after the pump task starts, and
    /// taken (and joined, bounded) by [`event_pump::stop`] on terminate.
    pub pump_handle: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(id: SessionId, engine: Arc<dyn DebugEngine>, transcript: TranscriptLog) -> Self {
        Self {
            id,
            engine,
            lock: AsyncMutex::new(()),
            transcript,
            events: EventBuffer::new(1024),
            last_launch: AsyncMutex::new(None),
            pump_cancel: CancellationToken::new(),
            pump_handle: AsyncMutex::new(None),
        }
    }
}
