#![allow(dead_code)]

use nexusmap::schema::{SchemaRegistry, SharedSchema};
use nexusmap::{CompilerConfig, Query};

pub const SCHEMA_TOML: &str = r#"
[[entity]]
name = "Rectangle"
id = { type = "object_id" }
[[entity.property]]
name = "width"
type = "double"
[[entity.property]]
name = "height"
type = "double"

[[entity]]
name = "ContainsRenamedFields"
id = { type = "object_id" }
[[entity.property]]
name = "firstName"
wire_name = "first_name"
type = "string"
[[entity.property]]
name = "lastName"
wire_name = "last_name"
type = "string"

[[entity]]
name = "PhotoWithKeywords"
id = { type = "object_id" }
[[entity.property]]
name = "keywords"
type = "embedded:Keyword"
array = true

[[entity]]
name = "Keyword"
[[entity.property]]
name = "keyword"
type = "string"
[[entity.property]]
name = "score"
type = "int"

[[entity]]
name = "ContainsPic"
id = { type = "object_id" }
[[entity.property]]
name = "name"
type = "string"
[[entity.property]]
name = "pic"
type = "embedded:Pic"
reference = true

[[entity]]
name = "Pic"
id = { type = "object_id" }
[[entity.property]]
name = "name"
type = "string"

[[entity]]
name = "IntVector"
id = { type = "object_id" }
[[entity.property]]
name = "scalars"
type = "int"
array = true

[[entity]]
name = "Person"
id = { name = "key", type = "embedded:PersonKey" }
[[entity.property]]
name = "address"
type = "embedded:Address"
[[entity.property]]
name = "attrs"
type = "map"
[[entity.property]]
name = "extra"
type = "document"
[[entity.property]]
name = "tags"
type = "string"
array = true

[[entity]]
name = "PersonKey"
[[entity.property]]
name = "region"
type = "string"
[[entity.property]]
name = "seq"
type = "long"

[[entity]]
name = "Address"
[[entity.property]]
name = "city"
wire_name = "c"
type = "string"
[[entity.property]]
name = "zip"
type = "string"
"#;

pub fn schema() -> SharedSchema {
    SchemaRegistry::from_toml_str(SCHEMA_TOML).unwrap().into_shared()
}

pub fn query(entity: &str) -> Query {
    Query::new(schema(), entity).unwrap()
}

pub fn query_with(entity: &str, config: CompilerConfig) -> Query {
    Query::with_config(schema(), entity, config).unwrap()
}
