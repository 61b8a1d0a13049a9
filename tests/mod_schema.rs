mod common;

use nexusmap::QueryError;
use nexusmap::schema::{DeclaredType, EntityDef, IdentifierDef, PropertyDef, SchemaRegistry, SchemaService};
use std::io::Write;

#[test]
fn toml_fixture_loads() {
    let reg = SchemaRegistry::from_toml_str(common::SCHEMA_TOML).unwrap();
    assert!(reg.contains("Keyword"));
    let p = reg.lookup_property("ContainsRenamedFields", "last_name").unwrap();
    assert_eq!(p.name, "lastName");
    let id = reg.identifier("Person").unwrap();
    assert_eq!(id.name, "key");
    assert_eq!(id.wire_name(), "_id");
    assert_eq!(reg.identifier("Rectangle").unwrap().name, "id");
}

#[test]
fn programmatic_build_and_json() {
    let reg = SchemaRegistry::new(vec![
        EntityDef::new("Order")
            .with_id(IdentifierDef::new("id", DeclaredType::Long))
            .with_property(PropertyDef::embedded("lines", "Line").array())
            .with_property(PropertyDef::new("customer", DeclaredType::ObjectId).wire_name("cust").reference()),
        EntityDef::new("Line").with_property(PropertyDef::new("qty", DeclaredType::Int)),
    ])
    .unwrap();
    assert_eq!(reg.type_names(), vec!["Line", "Order"]);
    assert!(reg.lookup_property("Order", "cust").is_some_and(|p| p.reference));

    let json = r#"{"entity": [{"name": "A", "property": [{"name": "b", "type": "embedded:B"}]},
                              {"name": "B", "property": [{"name": "c", "type": "string"}]}]}"#;
    let reg = SchemaRegistry::from_json_str(json).unwrap();
    assert_eq!(
        reg.lookup_property("A", "b").map(|p| p.declared_type.clone()),
        Some(DeclaredType::Embedded("B".into()))
    );
}

#[test]
fn inconsistent_definitions_rejected() {
    let dup = SchemaRegistry::new(vec![
        EntityDef::new("A")
            .with_property(PropertyDef::new("x", DeclaredType::Int))
            .with_property(PropertyDef::new("y", DeclaredType::Int).wire_name("x")),
    ]);
    assert!(matches!(dup, Err(QueryError::Config(_))));
    let dangling = SchemaRegistry::new(vec![EntityDef::new("A").with_property(PropertyDef::embedded("b", "Missing"))]);
    assert!(matches!(dangling, Err(QueryError::Config(_))));
    let bad_type = SchemaRegistry::from_toml_str("[[entity]]\nname = \"A\"\n[[entity.property]]\nname = \"x\"\ntype = \"decimal\"\n");
    assert!(matches!(bad_type, Err(QueryError::Config(_))));
}

#[test]
fn load_picks_format_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("schema.toml");
    std::fs::File::create(&toml_path).unwrap().write_all(common::SCHEMA_TOML.as_bytes()).unwrap();
    assert!(SchemaRegistry::load(&toml_path).unwrap().contains("Rectangle"));

    let json_path = dir.path().join("schema.json");
    std::fs::write(&json_path, r#"{"entity": [{"name": "Solo"}]}"#).unwrap();
    assert!(SchemaRegistry::load(&json_path).unwrap().contains("Solo"));

    let missing = SchemaRegistry::load(&dir.path().join("nope.toml"));
    assert!(matches!(missing, Err(QueryError::Io(_))));
}

#[test]
fn declared_type_string_forms() {
    assert_eq!("embedded:Address".parse::<DeclaredType>().unwrap(), DeclaredType::Embedded("Address".into()));
    assert_eq!(DeclaredType::Map.to_string(), "map");
    assert!("embedded:".parse::<DeclaredType>().is_err());
}
