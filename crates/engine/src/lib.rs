// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbg-engine: the Engine Adapter — a thin, capability-level
//! facade over a native debugger library. Every call is conceptually
//! blocking/synchronous from the caller's perspective; `async fn` here
//! just lets the implementation drive subprocess I/O without tying up an
//! OS thread, not a promise of engine-side concurrency (no engine method
//! is ever reentrant on the same handle — the Session Manager serializes
//! that, see `dbg-daemon::session`).

pub mod adapter;
pub mod command;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "test-support")]
pub mod sim;

pub use adapter::{DebugEngine, EngineError, EngineNotification};
pub use command::CommandOutcome;

#[cfg(feature = "native")]
pub use native::NativeEngine;

#[cfg(feature = "test-support")]
pub use sim::SimEngine;
