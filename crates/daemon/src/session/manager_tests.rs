use super::*;
use dbg_core::BreakpointLocation;

fn sim_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.use_simulated_engine = true;
    config.allow_launch = true;
    config.allow_attach = true;
    config.log_dir = dir.to_path_buf();
    config
}

#[tokio::test]
async fn unknown_session_id_is_session_not_found() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let err = manager.terminate(SessionId::new()).await.unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::SessionNotFound);
}

#[tokio::test]
async fn initialize_then_terminate_round_trips() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let id = manager.initialize().await;
    assert_eq!(manager.list_sessions().await, vec![id]);
    manager.terminate(id).await.expect("terminate");
    assert!(manager.list_sessions().await.is_empty());
}

#[tokio::test]
async fn launch_is_rejected_when_policy_disallows_it() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let mut config = sim_config(dir.path());
    config.allow_launch = false;
    let manager = SessionManager::new(config);
    let id = manager.initialize().await;
    let err = manager.launch(id, LaunchParams::default()).await.unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::LaunchNotAllowed);
}

#[tokio::test]
async fn launch_runs_the_target_and_records_a_transcript() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let id = manager.initialize().await;
    manager.create_target(id, "/bin/echo", None, None).await.expect("create target");
    let (pid, _state, transcript) = manager
        .launch(id, LaunchParams { args: vec!["hi".into()], ..Default::default() })
        .await
        .expect("launch");
    assert!(pid > 0);
    assert!(transcript.starts_with("(lldb) process launch\n"));

    let events = manager.poll_events(id, 16).await.expect("poll events");
    assert!(events.iter().any(|e| matches!(e.data, EventData::ProcessLaunched { .. })));
}

#[tokio::test]
async fn continue_on_a_not_yet_running_process_reports_already_running() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let id = manager.initialize().await;
    manager.create_target(id, "/bin/sleep", None, None).await.expect("create target");
    manager
        .launch(id, LaunchParams { args: vec!["2".into()], ..Default::default() })
        .await
        .expect("launch");

    manager.continue_process(id).await.expect("continue should not error");
}

#[tokio::test]
async fn breakpoint_set_then_list_then_delete() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let id = manager.initialize().await;
    manager.create_target(id, "/bin/echo", None, None).await.expect("create target");

    let breakpoint_id = manager
        .set_breakpoint(id, BreakpointLocation::Symbol("main"))
        .await
        .expect("set breakpoint");
    let listed = manager.list_breakpoints(id).await.expect("list");
    assert!(listed.iter().any(|b| b.id == breakpoint_id));

    manager.delete_breakpoint(id, breakpoint_id).await.expect("delete");
    let listed = manager.list_breakpoints(id).await.expect("list again");
    assert!(listed.iter().all(|b| b.id != breakpoint_id));
}

#[tokio::test]
async fn delete_unknown_breakpoint_is_a_breakpoint_error() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = SessionManager::new(sim_config(dir.path()));
    let id = manager.initialize().await;
    manager.create_target(id, "/bin/echo", None, None).await.expect("create target");

    let err = manager.delete_breakpoint(id, 9999).await.unwrap_err();
    assert_eq!(err.code, dbg_core::ErrorCode::BreakpointError);
}
