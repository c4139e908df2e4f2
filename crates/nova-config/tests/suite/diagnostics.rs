use nova_config::{ConfigWarning, NovaConfig};
use pretty_assertions::assert_eq;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[logging]
levle = "debug"

[debugger]
inline_fallback = false
"#;

    let (config, diagnostics) =
        NovaConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["debugger.inline_fallback", "logging.levle", "typo"]
    );
    // Misspelled keys leave the defaults in place.
    assert!(config.debugger.inline_depth_fallback);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn invalid_logging_directive_is_a_warning() {
    let text = r#"
[logging]
level = "nova.eval=loud"
"#;

    let (_config, diagnostics) =
        NovaConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::LoggingLevelInvalid {
            value: "nova.eval=loud".to_string(),
            normalized: "nova.eval=loud".to_string(),
        }]
    );
}
