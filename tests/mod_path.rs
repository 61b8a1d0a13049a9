mod common;

use common::schema;
use nexusmap::QueryError;
use nexusmap::query::PathResolver;
use nexusmap::schema::SchemaService;

fn resolver(s: &dyn SchemaService) -> PathResolver<'_> {
    PathResolver::new(s, 32)
}

#[test]
fn renamed_fields_resolve_by_either_name() {
    let s = schema();
    let r = resolver(&*s);
    let by_logical = r.resolve("ContainsRenamedFields", "firstName", true).unwrap();
    let by_wire = r.resolve("ContainsRenamedFields", "first_name", true).unwrap();
    assert_eq!(by_logical.wire_name(), "first_name");
    assert_eq!(by_logical, r.resolve("ContainsRenamedFields", "firstName", true).unwrap());
    assert_eq!(by_logical.wire_name(), by_wire.wire_name());
}

#[test]
fn nested_embedded_paths_use_wire_names() {
    let s = schema();
    let p = resolver(&*s).resolve("Person", "address.city", true).unwrap();
    assert_eq!(p.wire_name(), "address.c");
    assert_eq!(p.segments().len(), 2);
    assert!(p.is_validated());
}

#[test]
fn identifier_aliases_and_composite_id() {
    let s = schema();
    let r = resolver(&*s);
    for alias in ["id", "_id"] {
        assert_eq!(r.resolve("Rectangle", alias, true).unwrap().wire_name(), "_id");
    }
    assert_eq!(r.resolve("Person", "key.region", true).unwrap().wire_name(), "_id.region");
    assert_eq!(r.resolve("Person", "_id.seq", true).unwrap().wire_name(), "_id.seq");
    assert!(r.resolve("Person", "id", true).unwrap().is_identifier());
}

#[test]
fn unknown_field_names_segment_and_type() {
    let s = schema();
    let err = resolver(&*s).resolve("Person", "address.country", true).unwrap_err();
    match &err {
        QueryError::UnknownField { segment, type_name } => {
            assert_eq!(segment, "country");
            assert_eq!(type_name, "Address");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.is_validation());
    let msg = err.to_string();
    assert!(msg.contains("country") && msg.contains("Address"));
}

#[test]
fn validation_disabled_passes_raw_path() {
    let s = schema();
    let p = resolver(&*s).resolve("Person", "address.country.code", false).unwrap();
    assert_eq!(p.wire_name(), "address.country.code");
    assert!(!p.is_validated());
}

#[test]
fn reference_cannot_be_dotted() {
    let s = schema();
    let r = resolver(&*s);
    assert_eq!(r.resolve("ContainsPic", "pic", true).unwrap().wire_name(), "pic");
    let err = r.resolve("ContainsPic", "pic.name", true).unwrap_err();
    assert!(matches!(err, QueryError::ReferenceDotNotation { .. }));
    assert!(err.to_string().contains("Cannot use dot-notation"));
}

#[test]
fn map_and_document_pass_further_segments() {
    let s = schema();
    let r = resolver(&*s);
    assert_eq!(r.resolve("Person", "attrs.color", true).unwrap().wire_name(), "attrs.color");
    assert_eq!(r.resolve("Person", "extra.a.b.c", true).unwrap().wire_name(), "extra.a.b.c");
}

#[test]
fn scalars_have_no_subfields() {
    let s = schema();
    let err = resolver(&*s).resolve("Rectangle", "width.x", true).unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { ref type_name, .. } if type_name == "double"));
}

#[test]
fn depth_and_shape_guards() {
    let s = schema();
    let shallow = PathResolver::new(&*s, 2);
    assert!(matches!(shallow.resolve("Person", "extra.a.b", true), Err(QueryError::LimitExceeded(_))));
    assert!(matches!(resolver(&*s).resolve("Person", "", true), Err(QueryError::MalformedPredicate(_))));
    assert!(matches!(resolver(&*s).resolve("Person", "address..city", true), Err(QueryError::MalformedPredicate(_))));
    assert!(matches!(resolver(&*s).resolve("Nope", "a", true), Err(QueryError::UnknownEntity(_))));
}

#[test]
fn element_type_of_embedded_array() {
    let s = schema();
    let p = resolver(&*s).resolve("PhotoWithKeywords", "keywords", true).unwrap();
    assert_eq!(p.element_type(), Some("Keyword"));
    assert!(p.terminal().is_some_and(|t| t.array));
}
