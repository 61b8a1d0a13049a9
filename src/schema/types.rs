use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire name every identifier is stored under.
pub const ID_WIRE_NAME: &str = "_id";

/// Declared type of a mapped property.
///
/// Parsed from and printed to a compact string form so that schema files stay
/// flat: `"double"`, `"map"`, `"embedded:Keyword"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    String,
    Int,
    Long,
    Double,
    Bool,
    ObjectId,
    Date,
    Binary,
    /// Free-form sub-document; segments below it are not validated.
    Document,
    /// String-keyed map; the next segment is a key, anything below passes through.
    Map,
    /// A mapped embedded type, resolvable segment by segment.
    Embedded(String),
}

impl DeclaredType {
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::ObjectId => "object_id",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Document => "document",
            Self::Map => "map",
            Self::Embedded(name) => name,
        }
    }

    #[must_use]
    pub fn embedded_type(&self) -> Option<&str> {
        match self {
            Self::Embedded(name) => Some(name),
            _ => None,
        }
    }

    /// Whether segments below a property of this type skip validation.
    #[must_use]
    pub fn is_opaque_container(&self) -> bool {
        matches!(self, Self::Document | Self::Map)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded(name) => write!(f, "embedded:{name}"),
            other => f.write_str(other.type_name()),
        }
    }
}

impl FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(target) = s.strip_prefix("embedded:") {
            let target = target.trim();
            if target.is_empty() {
                return Err("embedded type requires a target name".into());
            }
            return Ok(Self::Embedded(target.to_string()));
        }
        Ok(match s {
            "string" => Self::String,
            "int" => Self::Int,
            "long" => Self::Long,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "object_id" => Self::ObjectId,
            "date" => Self::Date,
            "binary" => Self::Binary,
            "document" => Self::Document,
            "map" => Self::Map,
            other => return Err(format!("unknown declared type '{other}'")),
        })
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeclaredType> for String {
    fn from(t: DeclaredType) -> Self {
        t.to_string()
    }
}

/// A mapped property of an entity or embedded type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Logical (declared) name.
    pub name: String,
    /// Stored name; defaults to the logical name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
    #[serde(rename = "type")]
    pub declared_type: DeclaredType,
    /// Opaque foreign key into another collection.
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub array: bool,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self { name: name.into(), wire_name: None, declared_type, reference: false, array: false }
    }

    pub fn embedded(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Embedded(target.into()))
    }

    #[must_use]
    pub fn wire_name(mut self, wire: impl Into<String>) -> Self {
        self.wire_name = Some(wire.into());
        self
    }

    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub fn reference(mut self) -> Self {
        self.reference = true;
        self
    }

    #[must_use]
    pub fn stored_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }
}

/// Identifier of an entity. Always stored as `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierDef {
    #[serde(default = "default_id_name")]
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: DeclaredType,
}

fn default_id_name() -> String {
    "id".to_string()
}

impl IdentifierDef {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self { name: name.into(), declared_type }
    }

    #[must_use]
    pub fn wire_name(&self) -> &str {
        ID_WIRE_NAME
    }
}

/// Declarative description of a mapped type: an entity (with an identifier)
/// or an embedded type (without one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdentifierDef>,
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyDef>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), id: None, properties: Vec::new() }
    }

    #[must_use]
    pub fn with_id(mut self, id: IdentifierDef) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }
}
