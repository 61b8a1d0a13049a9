//! Typed criteria builder scoped to one resolved field.
//!
//! `FieldEnd` is the pending state between selecting a field and choosing an
//! operator. It carries the negation flag by value and is consumed by exactly
//! one operator call, which hands the finished criteria to its target.

use bson::{Bson, Document};

use crate::errors::{QueryError, Result};

use super::criteria::{Criteria, CriteriaContainer, ElemMatchCriteria, ElemMatchOperand, FieldCriteria, Join};
use super::descriptor::Query;
use super::operator::FilterOperator;
use super::path::FieldPath;

/// Receiver of a finished criteria node.
pub trait CriteriaTarget {
    type Output;
    fn accept(self, criteria: Criteria) -> Self::Output;
}

impl<'q> CriteriaTarget for &'q mut Query {
    type Output = &'q mut Query;

    fn accept(self, criteria: Criteria) -> Self::Output {
        self.add_criteria(criteria)
    }
}

/// Target that returns the criteria to the caller, for `and()`/`or()` and
/// `$elemMatch` composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl CriteriaTarget for Detached {
    type Output = Criteria;

    fn accept(self, criteria: Criteria) -> Criteria {
        criteria
    }
}

#[must_use = "a field selection does nothing until an operator is applied"]
pub struct FieldEnd<T> {
    path: FieldPath,
    negated: bool,
    max_in_set: usize,
    target: T,
}

impl<T: CriteriaTarget> FieldEnd<T> {
    pub(crate) fn new(path: FieldPath, max_in_set: usize, target: T) -> Self {
        Self { path, negated: false, max_in_set, target }
    }

    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Toggles negation of the next operator; `not().not()` cancels out.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Applies `op` to `operand` through the operator table.
    ///
    /// # Errors
    /// `OperatorMisuse` for container-only operators.
    pub fn apply(self, op: FilterOperator, operand: impl Into<Bson>) -> Result<T::Output> {
        let criteria = FieldCriteria::new(self.path, op, operand.into(), self.negated)?;
        Ok(self.target.accept(Criteria::Field(criteria)))
    }

    pub fn equal(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::Equal, value)
    }

    pub fn not_equal(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::NotEqual, value)
    }

    pub fn greater_than(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::GreaterThan, value)
    }

    pub fn greater_than_or_eq(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::GreaterThanOrEqual, value)
    }

    pub fn less_than(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::LessThan, value)
    }

    pub fn less_than_or_eq(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::LessThanOrEqual, value)
    }

    /// Equality; for array fields matches documents whose array holds `value`.
    pub fn has_this_one(self, value: impl Into<Bson>) -> Result<T::Output> {
        self.equal(value)
    }

    pub fn exists(self) -> Result<T::Output> {
        self.apply(FilterOperator::Exists, true)
    }

    pub fn does_not_exist(self) -> Result<T::Output> {
        self.apply(FilterOperator::Exists, false)
    }

    /// `$type` check; accepts a numeric type code or a type alias string.
    pub fn type_(self, bson_type: impl Into<Bson>) -> Result<T::Output> {
        self.apply(FilterOperator::Type, bson_type)
    }

    pub fn size_eq(self, size: i32) -> Result<T::Output> {
        self.apply(FilterOperator::Size, size)
    }

    pub fn mod_(self, divisor: i64, remainder: i64) -> Result<T::Output> {
        self.apply(FilterOperator::Mod, vec![Bson::Int64(divisor), Bson::Int64(remainder)])
    }

    pub fn near(self, x: f64, y: f64) -> Result<T::Output> {
        self.apply(FilterOperator::Near, vec![Bson::Double(x), Bson::Double(y)])
    }

    /// `$geoWithin` with a caller-built shape document such as `{"$box": [...]}`.
    pub fn within(self, shape: Document) -> Result<T::Output> {
        self.apply(FilterOperator::Within, shape)
    }

    fn set_operand<V: Into<Bson>>(&self, values: impl IntoIterator<Item = V>) -> Result<Bson> {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        if values.len() > self.max_in_set {
            log::warn!("set operand on '{}' has {} values (max {})", self.path, values.len(), self.max_in_set);
            return Err(QueryError::LimitExceeded(format!(
                "set operand on '{}' has {} values (max {})",
                self.path,
                values.len(),
                self.max_in_set
            )));
        }
        Ok(Bson::Array(values))
    }

    pub fn in_<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Result<T::Output> {
        let operand = self.set_operand(values)?;
        self.apply(FilterOperator::In, operand)
    }

    pub fn has_any_of<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Result<T::Output> {
        self.in_(values)
    }

    pub fn not_in<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Result<T::Output> {
        let operand = self.set_operand(values)?;
        self.apply(FilterOperator::NotIn, operand)
    }

    pub fn has_none_of<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Result<T::Output> {
        self.not_in(values)
    }

    pub fn has_all_of<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Result<T::Output> {
        let operand = self.set_operand(values)?;
        self.apply(FilterOperator::All, operand)
    }

    pub fn starts_with(self, prefix: &str) -> Result<T::Output> {
        self.apply(FilterOperator::StartsWith { case_insensitive: false }, format!("^{}", regex::escape(prefix)))
    }

    pub fn starts_with_ignore_case(self, prefix: &str) -> Result<T::Output> {
        self.apply(FilterOperator::StartsWith { case_insensitive: true }, format!("^{}", regex::escape(prefix)))
    }

    pub fn ends_with(self, suffix: &str) -> Result<T::Output> {
        self.apply(FilterOperator::EndsWith { case_insensitive: false }, format!("{}$", regex::escape(suffix)))
    }

    pub fn ends_with_ignore_case(self, suffix: &str) -> Result<T::Output> {
        self.apply(FilterOperator::EndsWith { case_insensitive: true }, format!("{}$", regex::escape(suffix)))
    }

    pub fn contains(self, text: &str) -> Result<T::Output> {
        self.apply(FilterOperator::Contains { case_insensitive: false }, regex::escape(text))
    }

    pub fn contains_ignore_case(self, text: &str) -> Result<T::Output> {
        self.apply(FilterOperator::Contains { case_insensitive: true }, regex::escape(text))
    }

    pub fn equal_ignore_case(self, value: &str) -> Result<T::Output> {
        self.apply(FilterOperator::Matches { case_insensitive: true }, format!("^{}$", regex::escape(value)))
    }

    /// Caller-supplied pattern, emitted as-is.
    pub fn matches(self, pattern: &str) -> Result<T::Output> {
        self.apply(FilterOperator::Matches { case_insensitive: false }, pattern)
    }

    pub fn matches_ignore_case(self, pattern: &str) -> Result<T::Output> {
        self.apply(FilterOperator::Matches { case_insensitive: true }, pattern)
    }

    fn elem_match_with(self, operand: ElemMatchOperand, negated: bool) -> T::Output {
        let criteria = ElemMatchCriteria::new(self.path, operand, negated);
        self.target.accept(Criteria::ElemMatch(criteria))
    }

    /// `$elemMatch` over a literal element document.
    pub fn has_this_element(self, element: Document) -> Result<T::Output> {
        let negated = self.negated;
        Ok(self.elem_match_with(ElemMatchOperand::Element(element), negated))
    }

    pub fn does_not_have_this_element(self, element: Document) -> Result<T::Output> {
        let negated = !self.negated;
        Ok(self.elem_match_with(ElemMatchOperand::Element(element), negated))
    }

    /// `$elemMatch` over pre-built criteria. A container built with `and()` or
    /// `or()` keeps its explicit form; anything else is emitted flat.
    pub fn elem_match(self, criteria: Criteria) -> Result<T::Output> {
        let operand = match criteria {
            Criteria::Container(c) => ElemMatchOperand::Container(c),
            other => ElemMatchOperand::Query(CriteriaContainer::with_children(Join::And, [other])),
        };
        let negated = self.negated;
        Ok(self.elem_match_with(operand, negated))
    }

    /// `$elemMatch` over a sub-query's criteria, compiled in the sub-query's
    /// own entity scope.
    ///
    /// # Errors
    /// `OperatorMisuse` when the field's element type is known and differs from
    /// the sub-query's entity.
    pub fn elem_match_query(self, sub: &Query) -> Result<T::Output> {
        if let Some(element) = self.path.element_type()
            && sub.is_validating()
            && element != sub.entity()
        {
            return Err(QueryError::OperatorMisuse(format!(
                "'{}' holds {element} elements but the sub-query targets {}",
                self.path,
                sub.entity()
            )));
        }
        let negated = self.negated;
        Ok(self.elem_match_with(ElemMatchOperand::Query(sub.root().clone()), negated))
    }
}

impl<T> std::fmt::Debug for FieldEnd<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEnd").field("path", &self.path).field("negated", &self.negated).finish_non_exhaustive()
    }
}
