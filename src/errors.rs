use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown field '{segment}' on type '{type_name}'")]
    UnknownField { segment: String, type_name: String },

    #[error("Cannot use dot-notation past reference field '{field}' in path '{path}'")]
    ReferenceDotNotation { path: String, field: String },

    #[error("Mixed projections are not supported: {0}")]
    MixedProjection(String),

    #[error("Malformed predicate: {0}")]
    MalformedPredicate(String),

    #[error("Operator misuse: {0}")]
    OperatorMisuse(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("Unsupported in memory: {0}")]
    Unsupported(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),
}

impl QueryError {
    /// True when running the same call with validation disabled could succeed.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }
}

impl From<std::io::Error> for QueryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
