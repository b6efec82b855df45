use super::*;

#[tokio::test]
async fn startup_binds_the_configured_port() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let mut config = Config::default();
    config.log_dir = dir.path().to_path_buf();
    config.server_port = 0; // ask the OS for a free port
    config.use_simulated_engine = true;

    let result = startup(config).await.expect("startup");
    let bound = result.listener.local_addr().expect("local_addr");
    assert!(bound.port() > 0);
}
