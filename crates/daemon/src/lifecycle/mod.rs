// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: config loading, tracing/audit-log
//! init, TCP bind, graceful shutdown.

mod startup;
pub use startup::{startup, StartupResult};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to bind {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
