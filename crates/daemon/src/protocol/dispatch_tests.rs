use super::*;
use crate::config::Config;
use crate::session::SessionManager;
use serde_json::json;

fn sim_manager(dir: &std::path::Path) -> SessionManager {
    let mut config = Config::default();
    config.use_simulated_engine = true;
    config.allow_launch = true;
    config.allow_attach = true;
    config.log_dir = dir.to_path_buf();
    SessionManager::new(config)
}

#[tokio::test]
async fn initialize_returns_a_session_id() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let result = dispatch(&manager, "initialize", json!({})).await.expect("initialize");
    assert!(result.get("sessionId").is_some());
}

#[tokio::test]
async fn dotted_lldb_prefixed_method_dispatches_the_same_as_the_bare_form() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let a = dispatch(&manager, "lldb.initialize", json!({})).await.expect("dotted");
    let b = dispatch(&manager, "initialize", json!({})).await.expect("bare");
    assert!(a.get("sessionId").is_some());
    assert!(b.get("sessionId").is_some());
}

#[tokio::test]
async fn tools_call_unwraps_name_and_arguments() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let result = dispatch(&manager, "tools.call", json!({"name": "initialize", "arguments": {}}))
        .await
        .expect("tools.call");
    assert!(result.get("sessionId").is_some());
}

#[tokio::test]
async fn create_target_launch_and_command_round_trip() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let init = dispatch(&manager, "initialize", json!({})).await.expect("initialize");
    let session_id = init["sessionId"].as_str().expect("sessionId").to_string();

    let created = dispatch(
        &manager,
        "createTarget",
        json!({ "sessionId": session_id, "file": "/bin/echo" }),
    )
    .await
    .expect("createTarget");
    assert!(created.get("transcript").is_some());

    let launched = dispatch(
        &manager,
        "launch",
        json!({ "sessionId": session_id, "args": ["hi"] }),
    )
    .await
    .expect("launch");
    assert!(launched["pid"].as_u64().unwrap() > 0);
    assert!(launched["transcript"].as_str().unwrap().starts_with("(lldb) process launch"));

    let commanded = dispatch(
        &manager,
        "command",
        json!({ "sessionId": session_id, "command": "help" }),
    )
    .await
    .expect("command");
    assert!(commanded.get("transcript").is_some());
}

#[tokio::test]
async fn missing_session_id_is_invalid_params() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let err = dispatch(&manager, "terminate", json!({})).await.unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::InvalidParams);
}

#[tokio::test]
async fn unknown_method_is_invalid_params() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let err = dispatch(&manager, "notARealMethod", json!({})).await.unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::InvalidParams);
}

#[tokio::test]
async fn set_breakpoint_requires_exactly_one_location_kind() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());
    let init = dispatch(&manager, "initialize", json!({})).await.expect("initialize");
    let session_id = init["sessionId"].as_str().unwrap().to_string();
    dispatch(&manager, "createTarget", json!({ "sessionId": session_id, "file": "/bin/echo" }))
        .await
        .expect("createTarget");

    let err = dispatch(&manager, "setBreakpoint", json!({ "sessionId": session_id }))
        .await
        .unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::InvalidParams);

    let ok = dispatch(
        &manager,
        "setBreakpoint",
        json!({ "sessionId": session_id, "symbol": "main" }),
    )
    .await
    .expect("setBreakpoint");
    assert!(ok.get("breakpointId").is_some());
}
