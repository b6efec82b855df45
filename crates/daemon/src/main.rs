// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgd`: binds the TCP listener and serves the wire protocol until
//! killed. `DBG_CONFIG` points at a TOML config file; every setting also
//! has a `DBG_*` environment override (see [`dbg_daemon::config`]).
//! `DBG_STDIO=1` additionally serves one client on stdin/stdout, for
//! callers that launch `dbgd` as a subprocess rather than dialing TCP.

use std::process::ExitCode;
use std::sync::Arc;

use dbg_daemon::{listener, startup, Config};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::var("DBG_CONFIG").ok().map(std::path::PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dbgd: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match startup(config).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("dbgd: startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let manager = Arc::clone(&result.manager);
    let stdio = std::env::var("DBG_STDIO").map(|v| v == "1").unwrap_or(false);
    if stdio {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { listener::run_stdio(manager).await });
    }

    listener::run_tcp(result.listener, manager).await;
    error!("tcp listener loop exited unexpectedly");
    ExitCode::FAILURE
}
