// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbg-daemon`: the long-lived debugging-control server.
//! A [`session::SessionManager`] owns every live [`session::Session`] and
//! is the sole thing [`listener`] and [`protocol::dispatch`] talk to;
//! [`lifecycle`] wires config, logging and the bound socket together for
//! the `dbgd` binary in `main.rs`.

pub mod config;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod session;

pub use config::Config;
pub use lifecycle::{startup, LifecycleError, StartupResult};
