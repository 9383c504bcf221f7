#![cfg(feature = "config")]

mod common;

use bodi::{Container, DiError, RegistrationProvider, SectionRegistrationProvider, TypeCatalog};
use common::{Clock, FrozenClock, Scheduler, SystemClock};

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with::<dyn Clock>("app::Clock")
        .with::<SystemClock>("app::SystemClock")
        .with::<FrozenClock>("app::FrozenClock")
}

#[test]
fn test_json_section_registers_types() {
    let json = r#"{
        "registrations": [
            { "type": "app::SystemClock", "as": "app::Clock" },
            { "type": "app::FrozenClock", "as": "app::Clock", "name": "frozen" }
        ]
    }"#;
    let provider = SectionRegistrationProvider::from_json(json, catalog()).unwrap();
    assert_eq!(provider.section().registrations.len(), 2);

    let container = Container::new();
    container.register_from(&provider).unwrap();

    assert_eq!(container.resolve::<Scheduler>().unwrap().clock.now(), 1_000);
    assert_eq!(container.resolve_named::<dyn Clock>("FROZEN").unwrap().now(), 0);
}

#[test]
fn test_yaml_section_registers_types() {
    let yaml = "
registrations:
  - type: app::SystemClock
    as: app::Clock
    name: ''
";
    let provider = SectionRegistrationProvider::from_yaml(yaml, catalog()).unwrap();

    let container = Container::new();
    container.register_from(&provider).unwrap();

    assert!(container.is_registered::<dyn Clock>(None).unwrap());
    assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 1_000);
}

#[test]
fn test_unknown_type_fails() {
    let json = r#"{ "registrations": [ { "type": "app::Missing", "as": "app::Clock" } ] }"#;
    let provider = SectionRegistrationProvider::from_json(json, catalog()).unwrap();

    assert_eq!(
        provider.registrations().unwrap_err(),
        DiError::UnknownType("app::Missing".into())
    );
    let container = Container::new();
    assert!(container.register_from(&provider).is_err());
}

#[test]
fn test_invalid_mapping_from_config_fails() {
    let json = r#"{ "registrations": [ { "type": "app::Clock", "as": "app::SystemClock" } ] }"#;
    let provider = SectionRegistrationProvider::from_json(json, catalog()).unwrap();

    let container = Container::new();
    assert!(matches!(
        container.register_from(&provider),
        Err(DiError::InvalidTypeMapping { .. })
    ));
}

#[test]
fn test_malformed_document_is_configuration_error() {
    let result = SectionRegistrationProvider::from_json("{ not json", catalog());
    assert!(matches!(result, Err(DiError::Configuration(_))));
}

#[test]
fn test_section_from_file() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registrations.yaml");
    let provider = SectionRegistrationProvider::from_file(path, catalog()).unwrap();

    let container = Container::new();
    container.register_from(&provider).unwrap();
    assert_eq!(container.resolve_named::<dyn Clock>("system").unwrap().now(), 1_000);
}
