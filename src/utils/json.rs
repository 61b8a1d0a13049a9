use crate::errors::{QueryError, Result};
use bson::{Bson, Document};

/// Parses any JSON value (relaxed extended JSON accepted) into a `Bson` value.
pub fn parse_json_to_bson(json: &str) -> Result<Bson> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    Ok(Bson::try_from(val)?)
}

/// Parses a JSON string into a document. The JSON must be a top-level object.
pub fn parse_json_to_bson_document(json: &str) -> Result<Document> {
    match parse_json_to_bson(json)? {
        Bson::Document(d) => Ok(d),
        other => Err(QueryError::MalformedPredicate(format!("expected JSON object, got {other}"))),
    }
}

/// Relaxed extended JSON rendering of a document.
#[must_use]
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}
