mod common;

use nexusmap::cli::{Command, OutputMode, run_with_format};
use std::path::PathBuf;

fn schema_file(dir: &tempfile::TempDir) -> PathBuf {
    let p = dir.path().join("schema.toml");
    std::fs::write(&p, common::SCHEMA_TOML).unwrap();
    p
}

fn run(cmd: Command, mode: OutputMode) -> String {
    let mut out = Vec::new();
    run_with_format(cmd, mode, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn compile_prints_documents() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = Command::Compile {
        schema: schema_file(&dir),
        entity: "ContainsRenamedFields".into(),
        filters: vec!["firstName =\"Ann\"".into(), "lastName !=\"Lee\"".into()],
        order: Some("-lastName".into()),
        project: vec!["firstName".into()],
        no_validation: false,
        config: None,
    };
    let out = run(cmd, OutputMode::Json);
    let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(v["filter"], serde_json::json!({"first_name": "Ann", "last_name": {"$ne": "Lee"}}));
    assert_eq!(v["sort"], serde_json::json!({"last_name": -1}));
    assert_eq!(v["projection"], serde_json::json!({"first_name": 1}));
}

#[test]
fn compile_reports_unknown_fields_unless_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let make = |no_validation| Command::Compile {
        schema: schema_file(&dir),
        entity: "Rectangle".into(),
        filters: vec!["depth >=2".into()],
        order: None,
        project: vec![],
        no_validation,
        config: None,
    };
    let mut sink = Vec::new();
    assert!(run_with_format(make(false), OutputMode::Plain, &mut sink).is_err());
    let out = run(make(true), OutputMode::Plain);
    assert!(out.starts_with("filter={\"depth\":{\"$gte\":2}}"));
}

#[test]
fn check_schema_lists_types() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(Command::CheckSchema { schema: schema_file(&dir) }, OutputMode::Plain);
    assert!(out.contains("Keyword") && out.contains("Rectangle"));
}
