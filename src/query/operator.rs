//! Logical predicate operators and their wire-level emission rules.

use crate::errors::{QueryError, Result};
use bson::{Bson, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Exists,
    Type,
    Size,
    In,
    NotIn,
    All,
    Near,
    Within,
    Mod,
    StartsWith { case_insensitive: bool },
    Contains { case_insensitive: bool },
    EndsWith { case_insensitive: bool },
    /// Caller-supplied regular expression.
    Matches { case_insensitive: bool },
    Where,
    ElemMatch,
    Not,
    And,
    Or,
}

impl FilterOperator {
    /// Every variant, with both case policies for the regex family.
    pub const ALL: [Self; 28] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::Exists,
        Self::Type,
        Self::Size,
        Self::In,
        Self::NotIn,
        Self::All,
        Self::Near,
        Self::Within,
        Self::Mod,
        Self::StartsWith { case_insensitive: false },
        Self::StartsWith { case_insensitive: true },
        Self::Contains { case_insensitive: false },
        Self::Contains { case_insensitive: true },
        Self::EndsWith { case_insensitive: false },
        Self::EndsWith { case_insensitive: true },
        Self::Matches { case_insensitive: false },
        Self::Matches { case_insensitive: true },
        Self::Where,
        Self::ElemMatch,
        Self::Not,
        Self::And,
        Self::Or,
    ];

    /// Wire token; `None` for bare equality.
    #[must_use]
    pub fn token(self) -> Option<&'static str> {
        Some(match self {
            Self::Equal => return None,
            Self::NotEqual => "$ne",
            Self::GreaterThan => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThan => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::Exists => "$exists",
            Self::Type => "$type",
            Self::Size => "$size",
            Self::In => "$in",
            Self::NotIn => "$nin",
            Self::All => "$all",
            Self::Near => "$near",
            Self::Within => "$geoWithin",
            Self::Mod => "$mod",
            Self::StartsWith { .. }
            | Self::Contains { .. }
            | Self::EndsWith { .. }
            | Self::Matches { .. } => "$regex",
            Self::Where => "$where",
            Self::ElemMatch => "$elemMatch",
            Self::Not => "$not",
            Self::And => "$and",
            Self::Or => "$or",
        })
    }

    /// Whether the operand is emitted as `{token: operand}` rather than raw.
    #[must_use]
    pub fn wraps(self) -> bool {
        !matches!(self, Self::Equal)
    }

    #[must_use]
    pub fn is_regex(self) -> bool {
        matches!(
            self,
            Self::StartsWith { .. } | Self::Contains { .. } | Self::EndsWith { .. } | Self::Matches { .. }
        )
    }

    #[must_use]
    pub fn case_insensitive(self) -> bool {
        match self {
            Self::StartsWith { case_insensitive }
            | Self::Contains { case_insensitive }
            | Self::EndsWith { case_insensitive }
            | Self::Matches { case_insensitive } => case_insensitive,
            _ => false,
        }
    }

    /// Operators that need container or sub-query handling.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::ElemMatch)
    }

    /// The operator that expresses the negation of `self`.
    ///
    /// Complement pairs map onto each other; operators without a complement
    /// are negated by `Not`, which is its own partner. Emission never folds
    /// negation through this table: a negated predicate always wraps in `$not`.
    #[must_use]
    pub fn negation_partner(self) -> Option<Self> {
        Some(match self {
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::GreaterThan => Self::LessThanOrEqual,
            Self::LessThanOrEqual => Self::GreaterThan,
            Self::GreaterThanOrEqual => Self::LessThan,
            Self::LessThan => Self::GreaterThanOrEqual,
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
            Self::Exists => Self::Exists,
            Self::Type
            | Self::Size
            | Self::All
            | Self::Near
            | Self::Within
            | Self::Mod
            | Self::StartsWith { .. }
            | Self::Contains { .. }
            | Self::EndsWith { .. }
            | Self::Matches { .. }
            | Self::ElemMatch
            | Self::Not => Self::Not,
            Self::Where | Self::And | Self::Or => return None,
        })
    }
}

/// Result of emitting a single-field predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub token: Option<&'static str>,
    pub value: Bson,
    /// `$options` flags carried next to a `$regex` token.
    pub options: Option<&'static str>,
}

impl Emitted {
    /// The value stored under the field name: raw for equality, otherwise
    /// `{token: value}`.
    #[must_use]
    pub fn into_field_value(self) -> Bson {
        match self.token {
            None => self.value,
            Some(token) => {
                let mut d = Document::new();
                d.insert(token, self.value);
                if let Some(opts) = self.options {
                    d.insert("$options", opts);
                }
                Bson::Document(d)
            }
        }
    }
}

/// Emits `operator` applied to `operand` for a single field.
///
/// # Errors
/// `OperatorMisuse` for `And`, `Or` and `ElemMatch`, which need container or
/// sub-query handling.
pub fn emit(operator: FilterOperator, operand: Bson) -> Result<Emitted> {
    if operator.is_composite() {
        return Err(QueryError::OperatorMisuse(format!(
            "{operator:?} cannot be emitted for a single field"
        )));
    }
    let options = (operator.is_regex() && operator.case_insensitive()).then_some("i");
    Ok(Emitted { token: operator.token(), value: operand, options })
}
