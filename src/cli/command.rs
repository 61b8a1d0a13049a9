use std::path::PathBuf;

pub enum Command {
    /// Compile string predicates, sort and projection into query documents.
    Compile {
        schema: PathBuf,
        entity: String,
        /// `"field=<json>"`, `"height >=4"` or `"tags in [\"a\"]"`.
        filters: Vec<String>,
        order: Option<String>,
        /// `"<field>[:0|1]"`.
        project: Vec<String>,
        no_validation: bool,
        config: Option<PathBuf>,
    },
    CheckSchema {
        schema: PathBuf,
    },
}
