//! Tests for the secret key registry.

use super::*;

#[test]
fn test_secret_key_rejects_empty() {
    assert!(matches!(
        SecretKey::new(""),
        Err(SignatureError::InvalidKey { .. })
    ));
}

#[test]
fn test_secret_key_debug_is_redacted() {
    let key = SecretKey::new("do-not-print-me").unwrap();
    let debug = format!("{:?}", key);

    assert!(!debug.contains("do-not-print-me"));
    assert!(debug.contains("<REDACTED>"));
    assert_eq!(key.len(), 15);
}

#[test]
fn test_create_secret_key_overwrites_default_slot() {
    let registry = SecretKeyRegistry::new();
    registry.create_secret_key("first").unwrap();
    registry.create_secret_key("second").unwrap();

    let keys = registry.snapshot();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].0, DEFAULT_KEY_NAME);
    assert_eq!(keys[0].1.expose_bytes(), b"second");
}

#[test]
fn test_create_secret_key_keeps_named_keys() {
    let registry = SecretKeyRegistry::new();
    registry.add_key("next", "new-secret").unwrap();
    registry.create_secret_key("old-secret").unwrap();

    assert_eq!(
        registry.names(),
        vec!["default".to_string(), "next".to_string()]
    );
}

#[test]
fn test_remove_key() {
    let registry = SecretKeyRegistry::with_secret("secret").unwrap();

    assert!(registry.remove_key(DEFAULT_KEY_NAME));
    assert!(!registry.remove_key(DEFAULT_KEY_NAME));
    assert!(registry.is_empty());
}

#[test]
fn test_add_key_rejects_blank_name() {
    let registry = SecretKeyRegistry::new();

    assert!(matches!(
        registry.add_key("  ", "secret"),
        Err(SignatureError::InvalidKey { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_clear_removes_everything() {
    let registry = SecretKeyRegistry::new();
    registry.add_key("a", "1").unwrap();
    registry.add_key("b", "2").unwrap();

    registry.clear();

    assert_eq!(registry.len(), 0);
}

#[test]
fn test_registry_debug_lists_names_only() {
    let registry = SecretKeyRegistry::with_secret("hidden-value").unwrap();
    let debug = format!("{:?}", registry);

    assert!(debug.contains("default"));
    assert!(!debug.contains("hidden-value"));
}
