use nova_config::{ConfigError, DebuggerConfig, NovaConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn debugger_section_overrides_fallback_policy() {
    let text = r#"
[debugger]
inline_depth_fallback = false
"#;

    let (config, diagnostics) =
        NovaConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    assert_eq!(
        config.debugger,
        DebuggerConfig {
            inline_depth_fallback: false,
            unlabeled_this_fallback: true,
        }
    );
}

#[test]
fn load_from_path_reads_logging_and_debugger_sections() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "[logging]\nlevel = \"debug\"\njson = true\n\n[debugger]\nunlabeled_this_fallback = false"
    )
    .expect("write config");

    let config = NovaConfig::load_from_path(file.path()).expect("config should load");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(config.logging.stderr);
    assert!(config.debugger.inline_depth_fallback);
    assert!(!config.debugger.unlabeled_this_fallback);
}

#[test]
fn missing_file_reports_io_error_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nova.toml");

    let err = NovaConfig::load_from_path(&path).expect_err("missing file should fail");
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path.display().to_string()),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn wrongly_typed_values_are_parse_errors() {
    let err = NovaConfig::load_from_str_with_diagnostics("[debugger]\ninline_depth_fallback = 3\n")
        .expect_err("integer is not a boolean");
    assert!(matches!(err, ConfigError::Toml(_)), "got {err:?}");
}
