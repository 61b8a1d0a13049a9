//! The criteria tree: leaf predicates, `$elemMatch` predicates and N-ary
//! logical containers, plus their emission into filter documents.
//!
//! Two emission shapes exist for AND. Criteria added to a query one after
//! another merge into one flat document keyed by field; a container built
//! explicitly with `and()` emits a `$and` array. Consumers depend on the exact
//! shape a construction method produces, so both are kept.

use crate::errors::{QueryError, Result};
use bson::{Bson, Document};

use super::operator::{self, FilterOperator};
use super::path::FieldPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    And,
    Or,
}

impl Join {
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }
}

/// A predicate on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCriteria {
    path: FieldPath,
    operator: FilterOperator,
    operand: Bson,
    negated: bool,
}

impl FieldCriteria {
    /// # Errors
    /// `OperatorMisuse` for operators that are not single-field predicates.
    pub fn new(path: FieldPath, operator: FilterOperator, operand: Bson, negated: bool) -> Result<Self> {
        if operator.is_composite() || matches!(operator, FilterOperator::Not | FilterOperator::Where) {
            return Err(QueryError::OperatorMisuse(format!(
                "{operator:?} is not a single-field operator (field '{}')",
                path.raw()
            )));
        }
        Ok(Self { path, operator, operand, negated })
    }

    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    #[must_use]
    pub fn operand(&self) -> &Bson {
        &self.operand
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// `(wire name, value)`; a negated predicate nests the normal value under `$not`.
    ///
    /// # Errors
    /// Propagates operator-table failures.
    pub fn to_entry(&self) -> Result<(String, Bson)> {
        let value = operator::emit(self.operator, self.operand.clone())?.into_field_value();
        Ok((self.path.wire_name().to_string(), negate_if(value, self.negated)))
    }
}

fn negate_if(value: Bson, negated: bool) -> Bson {
    if negated {
        let mut d = Document::new();
        d.insert("$not", value);
        Bson::Document(d)
    } else {
        value
    }
}

/// What an `$elemMatch` applies to each array element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemMatchOperand {
    /// Criteria of a sub-query scoped to the element type (flat emission).
    Query(CriteriaContainer),
    /// A pre-built container (explicit emission).
    Container(CriteriaContainer),
    /// A literal element document.
    Element(Document),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElemMatchCriteria {
    path: FieldPath,
    operand: ElemMatchOperand,
    negated: bool,
}

impl ElemMatchCriteria {
    #[must_use]
    pub fn new(path: FieldPath, operand: ElemMatchOperand, negated: bool) -> Self {
        Self { path, operand, negated }
    }

    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// # Errors
    /// Propagates emission failures from the nested criteria.
    pub fn to_entry(&self) -> Result<(String, Bson)> {
        let sub = match &self.operand {
            ElemMatchOperand::Query(c) => c.to_merged_document()?,
            ElemMatchOperand::Container(c) => c.to_document()?,
            ElemMatchOperand::Element(d) => d.clone(),
        };
        let mut inner = Document::new();
        inner.insert(FilterOperator::ElemMatch.token().unwrap_or("$elemMatch"), sub);
        Ok((self.path.wire_name().to_string(), negate_if(Bson::Document(inner), self.negated)))
    }
}

/// One node of the criteria tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Field(FieldCriteria),
    ElemMatch(ElemMatchCriteria),
    Container(CriteriaContainer),
    /// Top-level `$where` clause.
    Where(Bson),
    /// A verbatim filter document.
    Raw(Document),
}

impl Criteria {
    /// Explicit AND container; emits a `$and` array.
    pub fn and(children: impl IntoIterator<Item = Criteria>) -> Self {
        Self::Container(CriteriaContainer::with_children(Join::And, children))
    }

    /// Explicit OR container; emits a `$or` array.
    pub fn or(children: impl IntoIterator<Item = Criteria>) -> Self {
        Self::Container(CriteriaContainer::with_children(Join::Or, children))
    }

    /// Emits this node as a standalone document.
    ///
    /// # Errors
    /// Propagates emission failures.
    pub fn to_document(&self) -> Result<Document> {
        let mut out = Document::new();
        self.add_to(&mut out)?;
        Ok(out)
    }

    fn add_to(&self, out: &mut Document) -> Result<()> {
        match self {
            Self::Field(fc) => {
                let (k, v) = fc.to_entry()?;
                merge_entry(out, k, v);
            }
            Self::ElemMatch(em) => {
                let (k, v) = em.to_entry()?;
                merge_entry(out, k, v);
            }
            Self::Container(c) => {
                for (k, v) in c.to_document()? {
                    merge_entry(out, k, v);
                }
            }
            Self::Where(code) => {
                let token = operator::emit(FilterOperator::Where, code.clone())?;
                merge_entry(out, token.token.unwrap_or("$where").to_string(), token.value);
            }
            Self::Raw(doc) => {
                for (k, v) in doc {
                    merge_entry(out, k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }
}

impl From<FieldCriteria> for Criteria {
    fn from(c: FieldCriteria) -> Self {
        Self::Field(c)
    }
}

impl From<CriteriaContainer> for Criteria {
    fn from(c: CriteriaContainer) -> Self {
        Self::Container(c)
    }
}

/// An N-ary logical container. Children are owned exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaContainer {
    join: Join,
    children: Vec<Criteria>,
}

impl CriteriaContainer {
    #[must_use]
    pub fn new(join: Join) -> Self {
        Self { join, children: Vec::new() }
    }

    pub fn with_children(join: Join, children: impl IntoIterator<Item = Criteria>) -> Self {
        Self { join, children: children.into_iter().collect() }
    }

    #[must_use]
    pub fn join(&self) -> Join {
        self.join
    }

    #[must_use]
    pub fn children(&self) -> &[Criteria] {
        &self.children
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn add(&mut self, criteria: Criteria) {
        self.children.push(criteria);
    }

    /// Explicit emission: `{"$and": [...]}` or `{"$or": [...]}`; empty children
    /// are dropped and an empty container emits `{}`.
    ///
    /// # Errors
    /// Propagates emission failures from children.
    pub fn to_document(&self) -> Result<Document> {
        let mut list = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let d = child.to_document()?;
            if !d.is_empty() {
                list.push(Bson::Document(d));
            }
        }
        let mut out = Document::new();
        if !list.is_empty() {
            out.insert(self.join.token(), list);
        }
        Ok(out)
    }

    /// Flat emission used for a query's root: children merge into one
    /// document keyed by field. OR containers fall back to explicit emission.
    ///
    /// # Errors
    /// Propagates emission failures from children.
    pub fn to_merged_document(&self) -> Result<Document> {
        if self.join == Join::Or {
            return self.to_document();
        }
        let mut out = Document::new();
        for child in &self.children {
            child.add_to(&mut out)?;
        }
        Ok(out)
    }
}

/// An operator document: non-empty with every key starting with `$`.
#[must_use]
pub fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}

fn push_and(out: &mut Document, clause: Document) {
    match out.get_mut("$and") {
        Some(Bson::Array(list)) => list.push(Bson::Document(clause)),
        _ => {
            out.insert("$and", vec![Bson::Document(clause)]);
        }
    }
}

/// Adds `key: value` to a flat filter document without dropping constraints.
///
/// Disjoint operator documents on the same field merge key-by-key, `$and`
/// arrays concatenate, and any other collision moves into the `$and` array.
fn merge_entry(out: &mut Document, key: String, value: Bson) {
    let Some(existing) = out.get_mut(&key) else {
        out.insert(key, value);
        return;
    };
    match (existing, value) {
        (Bson::Array(list), Bson::Array(more)) if key == "$and" => list.extend(more),
        (Bson::Document(cur), Bson::Document(new))
            if !key.starts_with('$')
                && is_operator_document(cur)
                && is_operator_document(&new)
                && new.keys().all(|k| !cur.contains_key(k)) =>
        {
            for (k, v) in new {
                cur.insert(k, v);
            }
        }
        (_, value) => {
            let mut clause = Document::new();
            clause.insert(key, value);
            push_and(out, clause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn field(name: &str, op: FilterOperator, v: impl Into<Bson>) -> Criteria {
        FieldCriteria::new(FieldPath::unvalidated(name), op, v.into(), false).unwrap().into()
    }

    #[test]
    fn flat_merge_combines_range_on_one_field() {
        let root = CriteriaContainer::with_children(
            Join::And,
            [field("h", FilterOperator::GreaterThan, 3), field("h", FilterOperator::LessThan, 8)],
        );
        assert_eq!(root.to_merged_document().unwrap(), doc! {"h": {"$gt": 3, "$lt": 8}});
    }

    #[test]
    fn colliding_equality_moves_to_and() {
        let root = CriteriaContainer::with_children(
            Join::And,
            [field("w", FilterOperator::Equal, 1), field("w", FilterOperator::Equal, 2)],
        );
        assert_eq!(root.to_merged_document().unwrap(), doc! {"w": 1, "$and": [{"w": 2}]});
    }

    #[test]
    fn explicit_and_emits_array() {
        let c = Criteria::and([field("w", FilterOperator::Equal, 10), field("h", FilterOperator::Equal, 1)]);
        assert_eq!(c.to_document().unwrap(), doc! {"$and": [{"w": 10}, {"h": 1}]});
    }

    #[test]
    fn empty_container_is_noop() {
        let root = CriteriaContainer::with_children(Join::And, [Criteria::or([])]);
        assert!(root.to_merged_document().unwrap().is_empty());
    }

    #[test]
    fn repeated_explicit_and_extends_one_array() {
        let root = CriteriaContainer::with_children(
            Join::And,
            [Criteria::and([field("a", FilterOperator::Equal, 1)]), Criteria::and([field("b", FilterOperator::Equal, 2)])],
        );
        assert_eq!(root.to_merged_document().unwrap(), doc! {"$and": [{"a": 1}, {"b": 2}]});
    }

    #[test]
    fn field_criteria_rejects_containers() {
        let err = FieldCriteria::new(FieldPath::unvalidated("a"), FilterOperator::Or, Bson::Null, false).unwrap_err();
        assert!(matches!(err, QueryError::OperatorMisuse(_)));
    }
}
