//! Query-criteria compiler for a document-store mapping layer.
//!
//! Entity metadata lives in a [`schema::SchemaRegistry`]; a [`query::Query`]
//! collects typed or string-predicate criteria, sort, projection and options
//! for one entity and freezes into a [`query::QueryDescriptor`] holding the
//! filter, sort and projection documents.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod query;
pub mod schema;
pub mod utils;

pub use config::CompilerConfig;
pub use errors::{QueryError, Result};
pub use query::{Query, QueryDescriptor};
pub use schema::{SchemaRegistry, SchemaService};

/// Initializes logging from the `NEXUSMAP_*` environment variables.
///
/// Embedding applications that install their own `log` backend skip this.
pub fn init() {
    logger::configure_from_env();
}
