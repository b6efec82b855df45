use super::*;
use crate::config::Config;
use tokio::io::BufReader;

fn sim_manager(dir: &std::path::Path) -> SessionManager {
    let mut config = Config::default();
    config.use_simulated_engine = true;
    config.allow_launch = true;
    config.log_dir = dir.to_path_buf();
    SessionManager::new(config)
}

#[tokio::test]
async fn serves_a_single_line_request_and_writes_a_single_line_response() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());

    let input = b"{\"id\":\"1\",\"method\":\"initialize\",\"params\":{}}\n".to_vec();
    let mut output = Vec::new();
    serve_lines(BufReader::new(&input[..]), &mut output, &manager).await;

    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.matches('\n').count(), 1);
    let response: serde_json::Value = serde_json::from_str(text.trim_end()).expect("json");
    assert_eq!(response["id"], "1");
    assert!(response["result"]["sessionId"].is_string());
}

#[tokio::test]
async fn malformed_line_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());

    let input = b"not json\n{\"id\":\"2\",\"method\":\"ping\",\"params\":{}}\n".to_vec();
    let mut output = Vec::new();
    serve_lines(BufReader::new(&input[..]), &mut output, &manager).await;

    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.matches('\n').count(), 1);
    let response: serde_json::Value = serde_json::from_str(text.trim_end()).expect("json");
    assert_eq!(response["id"], "2");
}

#[tokio::test]
async fn unknown_method_yields_an_error_response_not_a_dropped_connection() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let manager = sim_manager(dir.path());

    let input = b"{\"id\":\"3\",\"method\":\"bogus\",\"params\":{}}\n".to_vec();
    let mut output = Vec::new();
    serve_lines(BufReader::new(&input[..]), &mut output, &manager).await;

    let text = String::from_utf8(output).expect("utf8");
    let response: serde_json::Value = serde_json::from_str(text.trim_end()).expect("json");
    assert_eq!(response["id"], "3");
    assert!(response["error"]["code"].is_u64());
}
