//! Projection specifications: an inclusion or exclusion field set plus
//! per-field array slices.

use bson::{Bson, Document};
use std::ops::Range;

use crate::errors::{QueryError, Result};
use crate::utils::num::{clamp_index, usize_to_i64};

use super::path::FieldPath;

/// `$slice` directive. A lone `limit` takes the first `limit` elements, or the
/// last `|limit|` when negative. With `skip`, a window of `limit` elements
/// starts at `skip`, counted from the end when `skip` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySlice {
    skip: Option<i32>,
    limit: i32,
}

impl ArraySlice {
    #[must_use]
    pub fn new(limit: i32) -> Self {
        Self { skip: None, limit }
    }

    #[must_use]
    pub fn with_skip(skip: i32, limit: i32) -> Self {
        Self { skip: Some(skip), limit }
    }

    #[must_use]
    pub fn skip(&self) -> Option<i32> {
        self.skip
    }

    #[must_use]
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// # Errors
    /// `OperatorMisuse` when a skip is given with a non-positive limit.
    pub fn validate(&self) -> Result<()> {
        if self.skip.is_some() && self.limit <= 0 {
            return Err(QueryError::OperatorMisuse(format!(
                "$slice limit must be positive when a skip is given (got {})",
                self.limit
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bson(&self) -> Bson {
        let value = match self.skip {
            Some(skip) => Bson::Array(vec![Bson::Int32(skip), Bson::Int32(self.limit)]),
            None => Bson::Int32(self.limit),
        };
        let mut d = Document::new();
        d.insert("$slice", value);
        Bson::Document(d)
    }

    /// Index range selected from an array of `len` elements.
    #[must_use]
    pub fn range(&self, len: usize) -> Range<usize> {
        let n = usize_to_i64(len);
        let limit = i64::from(self.limit);
        match self.skip {
            None if limit >= 0 => 0..clamp_index(limit, len),
            None => clamp_index(n + limit, len)..len,
            Some(skip) => {
                let skip = i64::from(skip);
                let start = clamp_index(if skip < 0 { n + skip } else { skip }, len);
                start..clamp_index(usize_to_i64(start) + limit.max(0), len)
            }
        }
    }

    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items[self.range(items.len())].to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionEntry {
    Flag(bool),
    Slice(ArraySlice),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectionSpec {
    mode: Option<ProjectionMode>,
    entries: Vec<(String, ProjectionEntry)>,
}

impl ProjectionSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed by the first non-identifier field projected.
    #[must_use]
    pub fn mode(&self) -> Option<ProjectionMode> {
        self.mode
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether `wire` already has an entry.
    #[must_use]
    pub fn contains(&self, wire: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == wire)
    }

    fn set(&mut self, wire: &str, entry: ProjectionEntry) {
        match self.entries.iter_mut().find(|(k, _)| k == wire) {
            Some((_, e)) => *e = entry,
            None => self.entries.push((wire.to_string(), entry)),
        }
    }

    /// # Errors
    /// `MixedProjection` when a non-identifier field asks for the opposite of
    /// the mode already fixed.
    pub fn project(&mut self, path: &FieldPath, include: bool) -> Result<()> {
        if !path.is_identifier() {
            let wanted = if include { ProjectionMode::Include } else { ProjectionMode::Exclude };
            match self.mode {
                None => self.mode = Some(wanted),
                Some(mode) if mode != wanted => {
                    return Err(QueryError::MixedProjection(format!(
                        "'{}' cannot be {} in an {} projection",
                        path,
                        if include { "included" } else { "excluded" },
                        if include { "exclusion" } else { "inclusion" }
                    )));
                }
                Some(_) => {}
            }
        }
        self.set(path.wire_name(), ProjectionEntry::Flag(include));
        Ok(())
    }

    /// Attaches a slice to `path`; independent of the projection mode.
    ///
    /// # Errors
    /// See [`ArraySlice::validate`].
    pub fn slice(&mut self, path: &FieldPath, slice: ArraySlice) -> Result<()> {
        slice.validate()?;
        self.set(path.wire_name(), ProjectionEntry::Slice(slice));
        Ok(())
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        for (k, e) in &self.entries {
            let v = match e {
                ProjectionEntry::Flag(include) => Bson::Int32(i32::from(*include)),
                ProjectionEntry::Slice(s) => s.to_bson(),
            };
            out.insert(k.clone(), v);
        }
        out
    }
}
