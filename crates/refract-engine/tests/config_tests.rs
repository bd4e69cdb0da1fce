//! Integration tests for permission configuration files

mod common;

use std::fs;

use common::zoo;
use refract_engine::{
    ConstructorFilter, FieldFilter, PermissionStore, ReflectConfig, ReflectError, ReflectionPermission,
};
use refract_sdk::Value;

const ZOO_CONFIG: &str = r#"
[reflect.permissions]
global = "PUBLIC_ONLY"

[reflect.permissions.packages]
"zoo" = "READ_ALL|INVOKE_ALL"
"zoo.*" = "NONE"
"#;

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reflect.toml");
    fs::write(&path, ZOO_CONFIG).unwrap();

    let mut store = PermissionStore::new();
    store.load_from_file(&path).unwrap();

    assert_eq!(store.get_global(), ReflectionPermission::PUBLIC_ONLY);
    assert_eq!(store.get_package("zoo"), Some(ReflectionPermission::READ_ALL | ReflectionPermission::INVOKE_ALL));
    assert_eq!(store.get_package_resolved("zoo.exhibits"), Some(ReflectionPermission::NONE));
}

#[test]
fn test_configured_store_drives_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reflect.toml");
    fs::write(&path, ZOO_CONFIG).unwrap();

    let config = ReflectConfig::load(&path).unwrap();
    let mut store = PermissionStore::new();
    config.apply(&mut store).unwrap();

    let zoo = zoo();
    let reflector = zoo.reflector().with_permissions(store);
    let obj = reflector
        .call_constructor(&zoo.dog, &ConstructorFilter::new(), &[Value::Double(2.0)])
        .unwrap();

    assert_eq!(
        reflector.read_field(&obj, true, &FieldFilter::new().named("legs")).unwrap(),
        Value::Int(4)
    );
    let err = reflector
        .write_field(&obj, false, &FieldFilter::new().named("breed"), Value::str("corgi"))
        .unwrap_err();
    assert!(matches!(err, ReflectError::PermissionDenied(_)));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReflectConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ReflectError::Config(ref msg) if msg.contains("absent.toml")));
}

#[test]
fn test_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[reflect.permissions\nglobal = ").unwrap();

    let mut store = PermissionStore::new();
    assert!(matches!(store.load_from_file(&path), Err(ReflectError::Config(_))));
    assert!(!store.has_any_restrictions());
}
