//! Execution collaborator contract and an in-memory implementation.

use bson::Document;

use crate::errors::Result;
use crate::utils::num::usize_to_u64;

use super::cursor::Cursor;
use super::descriptor::QueryDescriptor;
use super::eval::{apply_projection, compare_documents, matches};
use super::options::FindOptions;
use super::sort::NATURAL_KEY;

/// Runs compiled query documents against a store.
pub trait QueryExecutor {
    /// # Errors
    /// Implementation-specific execution failures.
    fn find(&self, filter: &Document, sort: &Document, projection: &Document, options: &FindOptions) -> Result<Cursor>;

    /// # Errors
    /// See [`QueryExecutor::find`].
    fn execute(&self, descriptor: &QueryDescriptor) -> Result<Cursor> {
        self.find(descriptor.filter(), descriptor.sort(), descriptor.projection(), descriptor.options())
    }
}

/// Documents held in insertion order, which is also their natural order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    name: String,
    docs: Vec<Document>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: Vec::new() }
    }

    pub fn from_documents(name: impl Into<String>, docs: impl IntoIterator<Item = Document>) -> Self {
        Self { name: name.into(), docs: docs.into_iter().collect() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, doc: Document) {
        self.docs.push(doc);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of documents matching `filter`.
    ///
    /// # Errors
    /// `Unsupported` for operators the evaluator does not implement.
    pub fn count(&self, filter: &Document) -> Result<usize> {
        let mut n = 0usize;
        for d in &self.docs {
            if matches(d, filter)? {
                n += 1;
            }
        }
        Ok(n)
    }
}

impl QueryExecutor for MemoryCollection {
    fn find(&self, filter: &Document, sort: &Document, projection: &Document, options: &FindOptions) -> Result<Cursor> {
        let start = std::time::Instant::now();
        let mut docs: Vec<&Document> = Vec::new();
        for d in &self.docs {
            if matches(d, filter)? {
                docs.push(d);
            }
        }

        if sort.get(NATURAL_KEY).is_some_and(|v| matches!(v, bson::Bson::Int32(n) if *n < 0)) {
            docs.reverse();
        } else if !sort.is_empty() {
            docs.sort_by(|a, b| compare_documents(sort, a, b));
        }

        let skip = options.skip.and_then(|s| usize::try_from(s).ok()).unwrap_or(0);
        let mut take =
            options.limit.and_then(|l| usize::try_from(l.unsigned_abs()).ok()).filter(|&l| l > 0).unwrap_or(usize::MAX);
        if let Some(b) = options.batch_size
            && b < 0
        {
            take = take.min(usize::try_from(b.unsigned_abs()).unwrap_or(usize::MAX));
        }
        let out: Vec<Document> =
            docs.into_iter().skip(skip).take(take).map(|d| apply_projection(d, projection)).collect();

        crate::dev6!(
            "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{},\"skip\":{}}}",
            self.name,
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            usize_to_u64(out.len()),
            usize_to_u64(skip)
        );
        Ok(Cursor::new(out))
    }
}
