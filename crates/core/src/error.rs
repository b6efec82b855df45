// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC error taxonomy. Every fallible Session Manager operation
//! returns `Result<_, DbgError>`; the RPC dispatch maps that 1:1 onto
//! the wire `{code, message, data}` error object.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Numeric error codes for the RPC surface. Kept as a fieldless enum
/// (rather than raw `u32`s scattered through the codebase) so a `match`
/// on `DbgError` can't silently drift from the documented table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    InvalidParams = 1001,
    SessionNotFound = 1002,
    EngineUnavailable = 2000,
    TargetMissing = 2001,
    ProcessMissing = 2002,
    AttachFailed = 2003,
    BreakpointError = 3001,
    WatchpointError = 3002,
    MemoryAccessFailed = 5001,
    LaunchNotAllowed = 7001,
    AttachNotAllowed = 7002,
    TargetOutsideAllowedRoot = 7003,
    Internal = 9999,
}

impl ErrorCode {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A domain error, convertible to the wire `{code, message, data}` shape.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DbgError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl DbgError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        Self { code, message: message.into(), data: Some(data) }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn session_not_found(session_id: impl std::fmt::Display) -> Self {
        Self::with_data(
            ErrorCode::SessionNotFound,
            "Session not found",
            serde_json::json!({ "sessionId": session_id.to_string() }),
        )
    }

    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EngineUnavailable, message)
    }

    pub fn target_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TargetMissing, message)
    }

    pub fn process_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessMissing, message)
    }

    pub fn attach_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AttachFailed, message)
    }

    pub fn breakpoint_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BreakpointError, message)
    }

    pub fn watchpoint_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::WatchpointError, message)
    }

    pub fn memory_access_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MemoryAccessFailed, message)
    }

    pub fn launch_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LaunchNotAllowed, message)
    }

    pub fn attach_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AttachNotAllowed, message)
    }

    pub fn target_outside_allowed_root(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TargetOutsideAllowedRoot, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        invalid_params             = { ErrorCode::InvalidParams, 1001 },
        session_not_found          = { ErrorCode::SessionNotFound, 1002 },
        engine_unavailable         = { ErrorCode::EngineUnavailable, 2000 },
        target_missing             = { ErrorCode::TargetMissing, 2001 },
        process_missing            = { ErrorCode::ProcessMissing, 2002 },
        attach_failed              = { ErrorCode::AttachFailed, 2003 },
        breakpoint_error           = { ErrorCode::BreakpointError, 3001 },
        watchpoint_error           = { ErrorCode::WatchpointError, 3002 },
        memory_access_failed       = { ErrorCode::MemoryAccessFailed, 5001 },
        launch_not_allowed         = { ErrorCode::LaunchNotAllowed, 7001 },
        attach_not_allowed         = { ErrorCode::AttachNotAllowed, 7002 },
        target_outside_allowed_root = { ErrorCode::TargetOutsideAllowedRoot, 7003 },
        internal                   = { ErrorCode::Internal, 9999 },
    )]
    fn error_codes_match_the_spec_table(code: ErrorCode, expected: u32) {
        assert_eq!(code.code(), expected);
    }

    #[test]
    fn session_not_found_carries_the_session_id_in_data() {
        let err = DbgError::session_not_found("abc-123");
        let data = err.data.expect("data present");
        assert_eq!(data["sessionId"], "abc-123");
    }
}
