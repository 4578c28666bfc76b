//! Loading plugin documents through the manager.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::json;
use stsm::{PluginManager, StsmError};

const CARD_POOL: &str = r#"
exports:
  pool_size: 75
  colors: [RED, GREEN]
suites:
  - name: card_pool_smoke
    description: Card pool sanity checks
    cases:
      - name: count
        class: com.example.CardPool
        method: size
"#;

fn write_plugin(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_yaml_plugin() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_plugin(&dir, "card_pool.yaml", CARD_POOL);
    let manager = PluginManager::new();

    let namespace = manager.load_plugin(&path).unwrap();
    assert_eq!(namespace.len(), 3);
    assert_eq!(manager.get_loaded_plugins(), vec!["card_pool".to_string()]);

    let size = manager
        .get_symbol("card_pool.pool_size")
        .unwrap()
        .downcast_arc::<serde_json::Value>()
        .unwrap();
    assert_eq!(*size, json!(75));

    let snapshot = manager.export_registry();
    let members: Vec<&str> = snapshot["card_pool"].keys().map(String::as_str).collect();
    assert_eq!(members, vec!["pool_size", "colors", "card_pool_smoke"]);
}

#[test]
fn test_load_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let manager = PluginManager::new();
    let second = write_plugin(&dir, "zeta.json", r#"{"exports": {"a": 1}}"#);
    let first = write_plugin(&dir, "alpha.yml", "exports:\n  b: 2\n");

    manager.load_plugin(&second).unwrap();
    manager.load_plugin(&first).unwrap();
    manager.load_plugin(&second).unwrap();
    assert_eq!(manager.get_loaded_plugins(), vec!["zeta".to_string(), "alpha".to_string()]);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let manager = PluginManager::new();

    let err = manager.load_plugin(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, StsmError::NotFound { .. }));

    let broken = write_plugin(&dir, "broken.yaml", "exports: [unterminated");
    let err = manager.load_plugin(&broken).unwrap_err();
    assert!(matches!(err, StsmError::LoadFailure { ref plugin, .. } if plugin == "broken"));

    assert!(manager.get_loaded_plugins().is_empty());
    assert!(!manager.export_registry().contains_key("broken"));
}
