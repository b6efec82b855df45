// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport for the wire protocol: one JSON object per line
//! over either a TCP socket or stdio. Both transports share the same
//! read/dispatch/write loop in [`serve_lines`], generic over the
//! reader/writer types; only how the byte stream is obtained differs.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response};
use crate::session::SessionManager;

/// Accept loop: one spawned task per TCP connection, so the server may
/// serve more than one concurrent client.
pub async fn run_tcp(listener: TcpListener, manager: Arc<SessionManager>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "accepted connection");
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    serve_lines(BufReader::new(reader), writer, &manager).await;
                    debug!(%addr, "connection closed");
                });
            }
            Err(e) => error!(error = %e, "tcp accept error"),
        }
    }
}

/// Serves a single client on stdin/stdout until stdin is closed.
pub async fn run_stdio(manager: Arc<SessionManager>) {
    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(stdin, tokio::io::stdout(), &manager).await;
}

/// Reads one JSON request per line, dispatches it, writes one JSON
/// response per line. A malformed line is logged and skipped rather than
/// closing the connection, since an RPC client may be line-buffered and
/// keep sending further requests.
pub async fn serve_lines<R, W>(mut reader: R, mut writer: W, manager: &SessionManager)
where
    R: AsyncBufReadExt + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "connection read error");
                return;
            }
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(trimmed) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, line = trimmed, "malformed request line");
                continue;
            }
        };

        // pollEvents is expected to be called frequently by a polling
        // client; log it at debug, everything else at info (mirrors the
        // teacher's Query/other log-level split).
        if protocol::normalize_method(&request.method) == "poll_events" {
            debug!(id = %request.id, method = %request.method, "received request");
        } else {
            info!(id = %request.id, method = %request.method, "received request");
        }

        let response = match protocol::dispatch(manager, &request.method, request.params).await {
            Ok(result) => Response::ok(request.id, result),
            Err(err) => Response::err(request.id, err),
        };

        let Ok(mut text) = serde_json::to_string(&response) else {
            error!("failed to serialize response");
            continue;
        };
        text.push('\n');
        if writer.write_all(text.as_bytes()).await.is_err() || writer.flush().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
