use crate::base::jarerror::JarError;

#[test]
fn test_malformed_display() {
    let err = JarError::malformed("entries: expected a map");
    assert!(err.is_malformed());
    let msg = err.to_string();
    assert!(msg.contains("Malformed cookie document"));
    assert!(msg.contains("entries: expected a map"));
}

#[test]
fn test_serde_json_errors_are_malformed() {
    let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    assert!(JarError::from(parse).is_malformed());

    let data = serde_json::from_str::<u64>("\"seven\"").unwrap_err();
    assert!(JarError::from(data).is_malformed());
}

#[test]
fn test_callback_failure_keeps_source() {
    use std::error::Error;

    let err = JarError::callback_failure("disk full".into());
    assert!(!err.is_malformed());
    assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
}
