//! Entity mapping metadata: declared properties, wire names and identifiers.

mod registry;
mod types;

pub use registry::{SchemaRegistry, SchemaService, SharedSchema};
pub use types::{DeclaredType, EntityDef, ID_WIRE_NAME, IdentifierDef, PropertyDef};
