#[test]
fn schema_describes_debugger_section() {
    let schema = serde_json::to_value(nova_config::json_schema()).expect("schema serializes");

    let definitions = schema
        .get("definitions")
        .and_then(|d| d.as_object())
        .expect("schema has definitions");
    let debugger = definitions
        .get("DebuggerConfig")
        .expect("DebuggerConfig definition");
    let properties = debugger
        .get("properties")
        .and_then(|p| p.as_object())
        .expect("DebuggerConfig properties");

    assert!(properties.contains_key("inline_depth_fallback"));
    assert!(properties.contains_key("unlabeled_this_fallback"));
    assert_eq!(debugger.get("additionalProperties"), Some(&serde_json::Value::Bool(false)));
}
