use crate::errors::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::types::{EntityDef, IdentifierDef, PropertyDef};

/// Mapping metadata the compiler consults while resolving field paths.
pub trait SchemaService {
    /// Finds a property of `entity` by logical name first, then by wire name.
    fn lookup_property(&self, entity: &str, name: &str) -> Option<&PropertyDef>;
    fn identifier(&self, entity: &str) -> Option<&IdentifierDef>;
    fn contains(&self, entity: &str) -> bool;
}

pub type SharedSchema = Arc<dyn SchemaService + Send + Sync>;

#[derive(Debug, Clone)]
struct MappedEntity {
    def: EntityDef,
    by_name: HashMap<String, usize>,
    by_wire: HashMap<String, usize>,
}

impl MappedEntity {
    fn build(def: EntityDef) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(def.properties.len());
        let mut by_wire = HashMap::with_capacity(def.properties.len());
        for (i, p) in def.properties.iter().enumerate() {
            if by_name.insert(p.name.clone(), i).is_some() {
                return Err(QueryError::Config(format!(
                    "duplicate property '{}' on type '{}'",
                    p.name, def.name
                )));
            }
            if by_wire.insert(p.stored_name().to_string(), i).is_some() {
                return Err(QueryError::Config(format!(
                    "duplicate wire name '{}' on type '{}'",
                    p.stored_name(),
                    def.name
                )));
            }
        }
        Ok(Self { def, by_name, by_wire })
    }

    fn get(&self, name: &str) -> Option<&PropertyDef> {
        self.by_name
            .get(name)
            .or_else(|| self.by_wire.get(name))
            .and_then(|&i| self.def.properties.get(i))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "entity")]
    entities: Vec<EntityDef>,
}

/// Immutable registry of mapped types, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, MappedEntity>,
}

impl SchemaRegistry {
    /// Builds the lookup tables. Every `embedded:<Type>` target must be registered.
    ///
    /// # Errors
    /// Returns `QueryError::Config` on duplicate type/property names or dangling embedded targets.
    pub fn new(defs: Vec<EntityDef>) -> Result<Self> {
        let mut entities = HashMap::with_capacity(defs.len());
        for def in defs {
            let name = def.name.clone();
            if entities.insert(name.clone(), MappedEntity::build(def)?).is_some() {
                return Err(QueryError::Config(format!("duplicate type '{name}'")));
            }
        }
        let registry = Self { entities };
        registry.check_targets()?;
        log::debug!("schema registry built with {} types", registry.entities.len());
        Ok(registry)
    }

    fn check_targets(&self) -> Result<()> {
        for mapped in self.entities.values() {
            let id_target = mapped.def.id.as_ref().and_then(|id| id.declared_type.embedded_type());
            let targets = mapped
                .def
                .properties
                .iter()
                .filter_map(|p| p.declared_type.embedded_type())
                .chain(id_target);
            for target in targets {
                if !self.entities.contains_key(target) {
                    return Err(QueryError::Config(format!(
                        "type '{}' embeds unknown type '{target}'",
                        mapped.def.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if the TOML is malformed or the definitions are inconsistent.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: SchemaFile =
            toml::from_str(s).map_err(|e| QueryError::Config(format!("schema TOML: {e}")))?;
        Self::new(file.entities)
    }

    /// # Errors
    /// Returns an error if the JSON is malformed or the definitions are inconsistent.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(s)?;
        Self::new(file.entities)
    }

    /// Loads a schema file; `.json` files are read as JSON, anything else as TOML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            Self::from_json_str(&s)
        } else {
            Self::from_toml_str(&s)
        }
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name).map(|m| &m.def)
    }

    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn into_shared(self) -> SharedSchema {
        Arc::new(self)
    }
}

impl SchemaService for SchemaRegistry {
    fn lookup_property(&self, entity: &str, name: &str) -> Option<&PropertyDef> {
        self.entities.get(entity).and_then(|m| m.get(name))
    }

    fn identifier(&self, entity: &str) -> Option<&IdentifierDef> {
        self.entities.get(entity).and_then(|m| m.def.id.as_ref())
    }

    fn contains(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }
}
