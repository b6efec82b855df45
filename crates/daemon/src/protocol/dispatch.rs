// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure request dispatch: no state, no locks, callable from
//! any number of concurrent transport handlers. `tools.call` is unwrapped
//! to its `name`/`arguments` pair before the method-name match, so both
//! forms produce identical behavior.

use dbg_core::{AttachRequest, BreakpointLocation, DbgError, LaunchParams, SessionId};
use serde_json::{json, Value};

use crate::session::SessionManager;

use super::envelope::normalize_method;

pub async fn dispatch(manager: &SessionManager, method: &str, params: Value) -> Result<Value, DbgError> {
    let (method, params) = unwrap_tools_call(method, params);
    match normalize_method(&method).as_str() {
        "ping" => Ok(json!({})),
        "initialize" => {
            let id = manager.initialize().await;
            Ok(json!({ "sessionId": id }))
        }
        "terminate" => {
            let id = session_id(&params)?;
            manager.terminate(id).await?;
            Ok(json!({ "ok": true }))
        }
        "list_sessions" => {
            let ids = manager.list_sessions().await;
            Ok(json!({ "sessions": ids.iter().map(ToString::to_string).collect::<Vec<_>>() }))
        }
        "create_target" => {
            let id = session_id(&params)?;
            let file = str_field(&params, "file")?;
            let arch = opt_str_field(&params, "arch");
            let triple = opt_str_field(&params, "triple");
            let platform = opt_str_field(&params, "platform");
            let (triple_resolved, transcript) =
                manager.create_target(id, &file, arch.as_deref(), triple.as_deref()).await?;
            Ok(json!({ "triple": triple_resolved, "platform": platform, "transcript": transcript }))
        }
        "launch" => {
            let id = session_id(&params)?;
            let launch_params = launch_params(&params);
            let (pid, state, transcript) = manager.launch(id, launch_params).await?;
            Ok(json!({ "pid": pid, "state": state as i32, "transcript": transcript }))
        }
        "attach" => {
            let id = session_id(&params)?;
            let request = attach_request(&params)?;
            let (pid, state, transcript) = manager.attach(id, request).await?;
            Ok(json!({ "pid": pid, "state": state as i32, "transcript": transcript }))
        }
        "restart" => {
            let id = session_id(&params)?;
            let (pid, state) = manager.restart(id).await?;
            Ok(json!({ "pid": pid, "state": state as i32 }))
        }
        "set_breakpoint" => {
            let id = session_id(&params)?;
            let file = opt_str_field(&params, "file");
            let symbol = opt_str_field(&params, "symbol");
            let address = params.get("address").and_then(Value::as_u64);
            let location = match (&file, params.get("line").and_then(Value::as_u64), &symbol, address) {
                (Some(file), Some(line), None, None) => BreakpointLocation::FileLine { file, line: line as u32 },
                (None, None, Some(symbol), None) => BreakpointLocation::Symbol(symbol),
                (None, None, None, Some(address)) => BreakpointLocation::Address(address),
                _ => {
                    return Err(DbgError::invalid_params(
                        "setBreakpoint requires exactly one of {file,line} | symbol | address",
                    ))
                }
            };
            let breakpoint_id = manager.set_breakpoint(id, location).await?;
            Ok(json!({ "breakpointId": breakpoint_id }))
        }
        "delete_breakpoint" => {
            let id = session_id(&params)?;
            let breakpoint_id = int_field(&params, "breakpointId")?;
            manager.delete_breakpoint(id, breakpoint_id).await?;
            Ok(json!({ "ok": true }))
        }
        "list_breakpoints" => {
            let id = session_id(&params)?;
            let breakpoints = manager.list_breakpoints(id).await?;
            Ok(json!({ "breakpoints": breakpoints }))
        }
        "update_breakpoint" => {
            let id = session_id(&params)?;
            let breakpoint_id = int_field(&params, "breakpointId")?;
            let enabled = params.get("enabled").and_then(Value::as_bool);
            let ignore_count = params.get("ignoreCount").and_then(Value::as_u64).map(|n| n as u32);
            let condition = opt_str_field(&params, "condition");
            let info = manager
                .update_breakpoint(id, breakpoint_id, enabled, ignore_count, condition.as_deref())
                .await?;
            Ok(serde_json::to_value(info).map_err(|e| DbgError::internal(e.to_string()))?)
        }
        "set_watchpoint" => {
            let id = session_id(&params)?;
            let address = int_u64_field(&params, "address")?;
            let size = params.get("size").and_then(Value::as_u64).unwrap_or(4) as u32;
            let read = params.get("read").and_then(Value::as_bool).unwrap_or(true);
            let write = params.get("write").and_then(Value::as_bool).unwrap_or(true);
            if !read && !write {
                return Err(DbgError::invalid_params("setWatchpoint requires read and/or write"));
            }
            let watchpoint_id = manager.set_watchpoint(id, address, size, read, write).await?;
            Ok(json!({ "watchpointId": watchpoint_id }))
        }
        "delete_watchpoint" => {
            let id = session_id(&params)?;
            let watchpoint_id = int_field(&params, "watchpointId")?;
            manager.delete_watchpoint(id, watchpoint_id).await?;
            Ok(json!({ "ok": true }))
        }
        "list_watchpoints" => {
            let id = session_id(&params)?;
            let watchpoints = manager.list_watchpoints(id).await?;
            Ok(json!({ "watchpoints": watchpoints }))
        }
        "continue" => {
            let id = session_id(&params)?;
            manager.continue_process(id).await?;
            Ok(json!({ "ok": true }))
        }
        "pause" => {
            let id = session_id(&params)?;
            manager.pause(id).await?;
            Ok(json!({ "ok": true }))
        }
        "step_in" => {
            let id = session_id(&params)?;
            manager.step_in(id).await?;
            Ok(json!({ "ok": true }))
        }
        "step_over" => {
            let id = session_id(&params)?;
            manager.step_over(id).await?;
            Ok(json!({ "ok": true }))
        }
        "step_out" => {
            let id = session_id(&params)?;
            manager.step_out(id).await?;
            Ok(json!({ "ok": true }))
        }
        "threads" => {
            let id = session_id(&params)?;
            Ok(json!({ "threads": manager.threads(id).await? }))
        }
        "frames" | "stack_trace" => {
            let id = session_id(&params)?;
            let thread_id = int_u64_field(&params, "threadId")?;
            Ok(json!({ "frames": manager.frames(id, thread_id).await? }))
        }
        "select_thread" => {
            let id = session_id(&params)?;
            let thread_id = int_u64_field(&params, "threadId")?;
            manager.select_thread(id, thread_id).await?;
            Ok(json!({ "ok": true }))
        }
        "select_frame" => {
            let id = session_id(&params)?;
            let thread_id = int_u64_field(&params, "threadId")?;
            let frame_index = params.get("frameIndex").and_then(Value::as_u64).unwrap_or(0) as u32;
            manager.select_frame(id, thread_id, frame_index).await?;
            Ok(json!({ "ok": true }))
        }
        "evaluate" => {
            let id = session_id(&params)?;
            let expr = str_field(&params, "expr")?;
            let frame_index = params.get("frameIndex").and_then(Value::as_u64).map(|n| n as u32);
            let result = manager.evaluate(id, &expr, frame_index).await?;
            Ok(json!({ "result": result }))
        }
        "read_registers" => {
            let id = session_id(&params)?;
            let thread_id = params.get("threadId").and_then(Value::as_u64);
            Ok(json!({ "registers": manager.read_registers(id, thread_id).await? }))
        }
        "write_register" => {
            let id = session_id(&params)?;
            let name = str_field(&params, "name")?;
            let value = str_field(&params, "value")?;
            manager.write_register(id, &name, &value).await?;
            Ok(json!({ "ok": true }))
        }
        "disassemble" => {
            let id = session_id(&params)?;
            let addr = params.get("addr").and_then(Value::as_u64);
            let count = params.get("count").and_then(Value::as_u64).unwrap_or(64) as u32;
            Ok(json!({ "instructions": manager.disassemble(id, addr, count).await? }))
        }
        "list_modules" => {
            let id = session_id(&params)?;
            Ok(json!({ "modules": manager.list_modules(id).await? }))
        }
        "search_symbol" => {
            let id = session_id(&params)?;
            let pattern = str_field(&params, "pattern")?;
            let module = opt_str_field(&params, "module");
            Ok(json!({ "matches": manager.search_symbol(id, &pattern, module.as_deref()).await? }))
        }
        "read_memory" => {
            let id = session_id(&params)?;
            let addr = int_u64_field(&params, "addr")?;
            let size = params.get("size").and_then(Value::as_u64).ok_or_else(|| {
                DbgError::invalid_params("readMemory requires an integer size")
            })? as usize;
            let bytes = manager.read_memory(id, addr, size).await?;
            Ok(json!({ "bytes": hex::encode(bytes) }))
        }
        "write_memory" => {
            let id = session_id(&params)?;
            let addr = int_u64_field(&params, "addr")?;
            let hex_bytes = str_field(&params, "hexBytes")?;
            let data = hex::decode(&hex_bytes).map_err(|e| DbgError::invalid_params(e.to_string()))?;
            let written = manager.write_memory(id, addr, &data).await?;
            Ok(json!({ "written": written }))
        }
        "command" => {
            let id = session_id(&params)?;
            let command_text = str_field(&params, "command")?;
            let (ok, output, error, transcript) = manager.command(id, &command_text).await?;
            Ok(json!({ "ok": ok, "output": output, "error": error, "transcript": transcript }))
        }
        "poll_events" => {
            let id = session_id(&params)?;
            let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(32) as usize;
            Ok(json!({ "events": manager.poll_events(id, limit).await? }))
        }
        other => Err(DbgError::invalid_params(format!("unknown method: {other}"))),
    }
}

/// `{"method": "tools.call", "params": {"name": "...", "arguments": {...}}}`
/// is interface-compatible with calling `name` directly with `arguments`
/// as `params`.
fn unwrap_tools_call(method: &str, params: Value) -> (String, Value) {
    if normalize_method(method) != "tools_call" {
        return (method.to_string(), params);
    }
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
    (name, arguments)
}

fn session_id(params: &Value) -> Result<SessionId, DbgError> {
    let raw = str_field(params, "sessionId")?;
    SessionId::parse(&raw).ok_or_else(|| DbgError::invalid_params(format!("malformed sessionId: {raw}")))
}

fn str_field(params: &Value, name: &str) -> Result<String, DbgError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DbgError::invalid_params(format!("missing required field: {name}")))
}

fn opt_str_field(params: &Value, name: &str) -> Option<String> {
    params.get(name).and_then(Value::as_str).map(str::to_string)
}

fn int_field(params: &Value, name: &str) -> Result<i32, DbgError> {
    params
        .get(name)
        .and_then(Value::as_i64)
        .map(|n| n as i32)
        .ok_or_else(|| DbgError::invalid_params(format!("missing required integer field: {name}")))
}

fn int_u64_field(params: &Value, name: &str) -> Result<u64, DbgError> {
    params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| DbgError::invalid_params(format!("missing required integer field: {name}")))
}

fn launch_params(params: &Value) -> LaunchParams {
    let args = params
        .get("args")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let env = params
        .get("env")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    let cwd = opt_str_field(params, "cwd").map(std::path::PathBuf::from);
    let flags = params
        .get("flags")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    LaunchParams { args, env, cwd, flags }
}

fn attach_request(params: &Value) -> Result<AttachRequest, DbgError> {
    let pid = params.get("pid").and_then(Value::as_u64);
    let name = opt_str_field(params, "name");
    match (pid, name) {
        (Some(pid), None) => Ok(AttachRequest::Pid(pid as u32)),
        (None, Some(name)) => Ok(AttachRequest::Name(name)),
        _ => Err(DbgError::invalid_params("attach requires exactly one of pid|name")),
    }
}
