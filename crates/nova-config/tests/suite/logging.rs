use nova_config::{init_tracing, LoggingConfig};

// The global subscriber can be installed once per process, so this is the only
// test in the binary that calls `init_tracing`.
#[test]
fn init_tracing_installs_once_and_appends_to_the_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nova.log");
    std::fs::write(&path, "previous session\n").expect("seed log file");

    let logging = LoggingConfig {
        level: "info".to_owned(),
        json: false,
        stderr: false,
        file: Some(path.clone()),
    };
    assert!(init_tracing(&logging));
    assert!(!init_tracing(&logging));

    tracing::warn!(target: "nova.config", "resolver policy reloaded");

    let contents = std::fs::read_to_string(&path).expect("read log file");
    assert!(contents.starts_with("previous session\n"), "{contents}");
    assert!(contents.contains("resolver policy reloaded"), "{contents}");
}
