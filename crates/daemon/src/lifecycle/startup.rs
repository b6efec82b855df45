// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: create directories, init the audit log, bind the TCP
//! listener last, then build the Session Manager.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::session::SessionManager;

use super::LifecycleError;

/// Everything `main` needs to start serving: the bound listener, the
/// shared session registry, and the tracing guard (dropping it flushes
/// the non-blocking `app.log` writer — must be held for the process
/// lifetime).
pub struct StartupResult {
    pub listener: TcpListener,
    pub manager: Arc<SessionManager>,
    pub config: Config,
    _log_guard: WorkerGuard,
}

pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.log_dir)?;

    let log_guard = init_tracing(&config)?;

    let addr = std::net::SocketAddr::new(config.server_host, config.server_port);
    let listener =
        TcpListener::bind(addr).await.map_err(|e| LifecycleError::BindFailed(addr, e))?;

    let manager = Arc::new(SessionManager::new(config.clone()));

    info!(%addr, "debug-control daemon listening");

    Ok(StartupResult { listener, manager, config, _log_guard: log_guard })
}

/// `tracing-subscriber` writes human-readable logs to stderr (controlled by
/// `RUST_LOG`/`DBG_LOG`), while a second, always-on non-blocking file
/// writer appends every session/command line to `<log_dir>/app.log` — a
/// durable audit trail independent of the operator's log verbosity.
fn init_tracing(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_env("DBG_LOG")
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| LifecycleError::Config(e.to_string()))?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    let _ = tracing_subscriber::registry().with(env_filter).with(stderr_layer).with(file_layer).try_init();

    Ok(guard)
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
