// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request/response envelope.

use dbg_core::DbgError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn ok(id: String, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: String, err: DbgError) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorBody { code: err.code.code(), message: err.message, data: err.data }),
        }
    }
}

/// `lldb.launch`, `lldb_launch`, and bare `launch` are all the same
/// method ("both dotted and underscored forms"): strip a
/// leading `lldb.`/`lldb_` namespace prefix if present, then normalize
/// the remainder's casing so a single `match` recognizes every spelling.
pub fn normalize_method(method: &str) -> String {
    let unprefixed = method.strip_prefix("lldb.").or_else(|| method.strip_prefix("lldb_")).unwrap_or(method);
    to_snake_case(unprefixed)
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '.' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}
