//! Sort specifications built from a delimited string or explicit directives.

use bson::Document;
use std::cmp::Ordering;

use crate::errors::{QueryError, Result};

use super::eval;
use super::path::FieldPath;

/// Pseudo-key for the store's natural order.
pub const NATURAL_KEY: &str = "$natural";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn wire_value(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    #[must_use]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

/// An ordering directive before field resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    field: Option<String>,
    direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { field: Some(field.into()), direction: SortDirection::Ascending }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self { field: Some(field.into()), direction: SortDirection::Descending }
    }

    #[must_use]
    pub fn natural_ascending() -> Self {
        Self { field: None, direction: SortDirection::Ascending }
    }

    #[must_use]
    pub fn natural_descending() -> Self {
        Self { field: None, direction: SortDirection::Descending }
    }

    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    #[must_use]
    pub fn is_natural(&self) -> bool {
        self.field.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: FieldPath,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortSpec {
    #[default]
    Unsorted,
    /// Keys in tie-break precedence order.
    Fields(Vec<SortKey>),
    Natural(SortDirection),
}

impl SortSpec {
    /// Parses `"width,-height"`. A leading `-` means descending; `$natural`
    /// and `-$natural` select natural order.
    ///
    /// # Errors
    /// `InvalidSort` for empty tokens, duplicates or natural order mixed with
    /// fields; resolution errors from `resolve`.
    pub fn parse(spec: &str, resolve: impl FnMut(&str) -> Result<FieldPath>) -> Result<Self> {
        if spec.trim().is_empty() {
            return Err(QueryError::InvalidSort("empty sort specification".into()));
        }
        let mut directives = Vec::new();
        for token in spec.split(',').map(str::trim) {
            let (name, direction) = match token.strip_prefix('-') {
                Some(rest) => (rest.trim(), SortDirection::Descending),
                None => (token, SortDirection::Ascending),
            };
            if name.is_empty() {
                return Err(QueryError::InvalidSort(format!("empty sort key in '{spec}'")));
            }
            directives.push(if name == NATURAL_KEY {
                Sort { field: None, direction }
            } else {
                Sort { field: Some(name.to_string()), direction }
            });
        }
        Self::from_directives(directives, resolve)
    }

    /// Builds from directives, preserving argument order.
    ///
    /// # Errors
    /// See [`SortSpec::parse`].
    pub fn from_directives(
        directives: impl IntoIterator<Item = Sort>,
        mut resolve: impl FnMut(&str) -> Result<FieldPath>,
    ) -> Result<Self> {
        let mut keys: Vec<SortKey> = Vec::new();
        let mut natural = None;
        for d in directives {
            match d.field {
                None => {
                    if natural.is_some() || !keys.is_empty() {
                        return Err(QueryError::InvalidSort(
                            "natural order cannot be combined with other sort keys".into(),
                        ));
                    }
                    natural = Some(d.direction);
                }
                Some(name) => {
                    if natural.is_some() {
                        return Err(QueryError::InvalidSort(
                            "natural order cannot be combined with other sort keys".into(),
                        ));
                    }
                    let path = resolve(&name)?;
                    if keys.iter().any(|k| k.path.wire_name() == path.wire_name()) {
                        return Err(QueryError::InvalidSort(format!("duplicate sort key '{name}'")));
                    }
                    keys.push(SortKey { path, direction: d.direction });
                }
            }
        }
        Ok(match natural {
            Some(dir) => Self::Natural(dir),
            None if keys.is_empty() => Self::Unsorted,
            None => Self::Fields(keys),
        })
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        match self {
            Self::Fields(keys) => keys,
            _ => &[],
        }
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        match self {
            Self::Unsorted => {}
            Self::Fields(keys) => {
                for k in keys {
                    out.insert(k.path.wire_name(), k.direction.wire_value());
                }
            }
            Self::Natural(dir) => {
                out.insert(NATURAL_KEY, dir.wire_value());
            }
        }
        out
    }

    /// Multi-key lexicographic comparison of two documents. Natural order has
    /// no document-level comparison and treats all documents as equal.
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for k in self.keys() {
            let ord = k.direction.apply(eval::compare_field(a, b, k.path.wire_name()));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> Result<FieldPath> {
        Ok(FieldPath::unvalidated(name))
    }

    #[test]
    fn natural_alone_is_accepted() {
        assert_eq!(SortSpec::parse("-$natural", raw).unwrap(), SortSpec::Natural(SortDirection::Descending));
    }

    #[test]
    fn natural_mixed_with_field_is_rejected() {
        let err = SortSpec::from_directives([Sort::ascending("w"), Sort::natural_ascending()], raw).unwrap_err();
        assert!(matches!(err, QueryError::InvalidSort(_)));
    }

    #[test]
    fn empty_tokens_rejected() {
        for spec in ["", "a,,b", "-", " , "] {
            assert!(matches!(SortSpec::parse(spec, raw), Err(QueryError::InvalidSort(_))), "{spec:?}");
        }
    }

    #[test]
    fn duplicate_rejected() {
        assert!(matches!(SortSpec::parse("a,-a", raw), Err(QueryError::InvalidSort(_))));
    }
}
