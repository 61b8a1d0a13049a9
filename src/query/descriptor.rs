//! `Query` (the mutable builder) and `QueryDescriptor` (its frozen output).

use bson::{Bson, Document, JavaScriptCodeWithScope};
use serde::Serialize;

use crate::config::CompilerConfig;
use crate::errors::{QueryError, Result};
use crate::schema::SharedSchema;

use super::criteria::{Criteria, CriteriaContainer, Join};
use super::field::{Detached, FieldEnd};
use super::operator::FilterOperator;
use super::options::{
    Collation, CursorType, FindOptions, MODIFIER_MAX_SCAN, MODIFIER_SNAPSHOT, ReadPreference,
};
use super::parse::parse_condition;
use super::path::{FieldPath, PathResolver};
use super::projection::{ArraySlice, ProjectionSpec};
use super::sort::{Sort, SortSpec};

/// A query under construction for one entity type.
///
/// Owned by one caller; freeze it to obtain an immutable [`QueryDescriptor`].
#[derive(Clone)]
pub struct Query {
    schema: SharedSchema,
    entity: String,
    config: CompilerConfig,
    validation: bool,
    root: CriteriaContainer,
    sort: SortSpec,
    projection: ProjectionSpec,
    options: FindOptions,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("entity", &self.entity)
            .field("validation", &self.validation)
            .field("root", &self.root)
            .field("sort", &self.sort)
            .field("projection", &self.projection)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Query {
    /// # Errors
    /// `UnknownEntity` if the schema does not map `entity`.
    pub fn new(schema: SharedSchema, entity: &str) -> Result<Self> {
        Self::with_config(schema, entity, CompilerConfig::default())
    }

    /// # Errors
    /// `UnknownEntity` if validation is on and the schema does not map `entity`.
    pub fn with_config(schema: SharedSchema, entity: &str, config: CompilerConfig) -> Result<Self> {
        if config.validation && !schema.contains(entity) {
            return Err(QueryError::UnknownEntity(entity.to_string()));
        }
        let validation = config.validation;
        Ok(Self {
            schema,
            entity: entity.to_string(),
            config,
            validation,
            root: CriteriaContainer::new(Join::And),
            sort: SortSpec::Unsorted,
            projection: ProjectionSpec::new(),
            options: FindOptions::default(),
        })
    }

    /// Seeds the root with a verbatim filter document.
    ///
    /// # Errors
    /// See [`Query::new`].
    pub fn from_document(schema: SharedSchema, entity: &str, filter: Document) -> Result<Self> {
        let mut q = Self::new(schema, entity)?;
        if !filter.is_empty() {
            q.root.add(Criteria::Raw(filter));
        }
        Ok(q)
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.validation
    }

    #[must_use]
    pub fn root(&self) -> &CriteriaContainer {
        &self.root
    }

    #[must_use]
    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    #[must_use]
    pub fn projection_spec(&self) -> &ProjectionSpec {
        &self.projection
    }

    #[must_use]
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Paths resolved after this call pass through unchecked.
    pub fn disable_validation(&mut self) -> &mut Self {
        log::warn!("field validation disabled for query on {}", self.entity);
        self.validation = false;
        self
    }

    pub fn enable_validation(&mut self) -> &mut Self {
        self.validation = true;
        self
    }

    /// Resolves `raw` in this query's entity scope.
    ///
    /// # Errors
    /// Path resolution errors.
    pub fn resolve(&self, raw: &str) -> Result<FieldPath> {
        PathResolver::new(&*self.schema, self.config.max_path_depth).resolve(&self.entity, raw, self.validation)
    }

    /// Selects a field; the operator call adds the criteria to this query.
    ///
    /// # Errors
    /// Path resolution errors, reported here rather than at freeze time.
    pub fn field(&mut self, name: &str) -> Result<FieldEnd<&mut Self>> {
        let path = self.resolve(name)?;
        let max_in_set = self.config.max_in_set;
        Ok(FieldEnd::new(path, max_in_set, self))
    }

    /// Selects a field for criteria built outside the query, e.g. for `and()`.
    ///
    /// # Errors
    /// Path resolution errors.
    pub fn criteria(&self, name: &str) -> Result<FieldEnd<Detached>> {
        Ok(FieldEnd::new(self.resolve(name)?, self.config.max_in_set, Detached))
    }

    pub fn add_criteria(&mut self, criteria: Criteria) -> &mut Self {
        self.root.add(criteria);
        self
    }

    /// Adds a string predicate such as `("height >", 4)`.
    ///
    /// Fields starting with `$` pass through verbatim as `{field: value}`.
    ///
    /// # Errors
    /// `MalformedPredicate` for unparseable conditions or operands of the
    /// wrong shape; path resolution errors.
    pub fn filter(&mut self, condition: &str, value: impl Into<Bson>) -> Result<&mut Self> {
        let (field, op) = parse_condition(condition)?;
        let value = value.into();
        if field.starts_with('$') {
            if op != FilterOperator::Equal {
                return Err(QueryError::MalformedPredicate(format!(
                    "raw key '{field}' takes no comparator"
                )));
            }
            let mut raw = Document::new();
            raw.insert(field, value);
            return Ok(self.add_criteria(Criteria::Raw(raw)));
        }
        let end = self.field(&field)?;
        match (op, value) {
            (FilterOperator::ElemMatch, Bson::Document(d)) => end.has_this_element(d),
            (FilterOperator::ElemMatch, other) => Err(QueryError::MalformedPredicate(format!(
                "'{condition}' expects a document, got {other}"
            ))),
            (FilterOperator::In | FilterOperator::NotIn | FilterOperator::All, Bson::Array(values)) => {
                match op {
                    FilterOperator::In => end.in_(values),
                    FilterOperator::NotIn => end.not_in(values),
                    _ => end.has_all_of(values),
                }
            }
            (FilterOperator::In | FilterOperator::NotIn | FilterOperator::All, other) => Err(
                QueryError::MalformedPredicate(format!("'{condition}' expects an array, got {other}")),
            ),
            (op, value) => end.apply(op, value),
        }
    }

    /// Adds an explicit AND container, emitted as a `$and` array.
    pub fn and(&mut self, criteria: impl IntoIterator<Item = Criteria>) -> &mut Self {
        self.add_criteria(Criteria::and(criteria))
    }

    /// Adds an OR container, emitted as a `$or` array.
    pub fn or(&mut self, criteria: impl IntoIterator<Item = Criteria>) -> &mut Self {
        self.add_criteria(Criteria::or(criteria))
    }

    /// Top-level `$where` clause.
    pub fn where_(&mut self, code: impl Into<String>) -> &mut Self {
        self.add_criteria(Criteria::Where(Bson::String(code.into())))
    }

    /// Top-level `$where` clause with a scope document for the code's free variables.
    pub fn where_with_scope(&mut self, code: impl Into<String>, scope: Document) -> &mut Self {
        let code = JavaScriptCodeWithScope { code: code.into(), scope };
        self.add_criteria(Criteria::Where(Bson::JavaScriptCodeWithScope(code)))
    }

    /// An empty query scoped to the element type of the embedded field `path`,
    /// for building `$elemMatch` criteria.
    ///
    /// # Errors
    /// Path resolution errors; `OperatorMisuse` when validation is on and the
    /// field is not an embedded type.
    pub fn sub_query_for(&self, path: &str) -> Result<Query> {
        let resolved = self.resolve(path)?;
        let element = match resolved.element_type() {
            Some(t) => t.to_string(),
            None if !self.validation => self.entity.clone(),
            None => {
                return Err(QueryError::OperatorMisuse(format!(
                    "'{path}' on {} is not an embedded field",
                    self.entity
                )));
            }
        };
        let mut config = self.config.clone();
        config.validation = self.validation;
        Ok(Self {
            schema: self.schema.clone(),
            entity: element,
            config,
            validation: self.validation,
            root: CriteriaContainer::new(Join::And),
            sort: SortSpec::Unsorted,
            projection: ProjectionSpec::new(),
            options: FindOptions::default(),
        })
    }

    /// `{path: {$elemMatch: <sub-query criteria>}}`.
    ///
    /// # Errors
    /// See [`FieldEnd::elem_match_query`].
    pub fn elem_match_query(&mut self, path: &str, sub: &Query) -> Result<&mut Self> {
        self.field(path)?.elem_match_query(sub)
    }

    fn replace_sort(&mut self, sort: SortSpec) -> Result<&mut Self> {
        if sort.keys().len() > self.config.max_sort_fields {
            log::warn!("sort on {} has {} keys", self.entity, sort.keys().len());
            return Err(QueryError::LimitExceeded(format!(
                "sort has {} keys (max {})",
                sort.keys().len(),
                self.config.max_sort_fields
            )));
        }
        self.sort = sort;
        Ok(self)
    }

    /// Replaces the sort with `"width,-height"` style input.
    ///
    /// # Errors
    /// `InvalidSort`, `LimitExceeded` or path resolution errors.
    pub fn order(&mut self, spec: &str) -> Result<&mut Self> {
        let sort = SortSpec::parse(spec, |f| self.resolve(f))?;
        self.replace_sort(sort)
    }

    /// Replaces the sort with explicit directives.
    ///
    /// # Errors
    /// See [`Query::order`].
    pub fn order_by(&mut self, directives: impl IntoIterator<Item = Sort>) -> Result<&mut Self> {
        let sort = SortSpec::from_directives(directives, |f| self.resolve(f))?;
        self.replace_sort(sort)
    }

    fn check_projection_room(&self, path: &FieldPath) -> Result<()> {
        if self.projection.contains(path.wire_name()) {
            return Ok(());
        }
        if self.projection.len() >= self.config.max_projection_fields {
            return Err(QueryError::LimitExceeded(format!(
                "projection already has {} fields",
                self.projection.len()
            )));
        }
        Ok(())
    }

    /// # Errors
    /// `MixedProjection`, `LimitExceeded` or path resolution errors.
    pub fn project(&mut self, field: &str, include: bool) -> Result<&mut Self> {
        let path = self.resolve(field)?;
        self.check_projection_room(&path)?;
        self.projection.project(&path, include)?;
        Ok(self)
    }

    /// Projects every field in `fields` the same way.
    ///
    /// # Errors
    /// See [`Query::project`]; fields before the failing one stay projected.
    pub fn retrieved_fields(&mut self, include: bool, fields: &[&str]) -> Result<&mut Self> {
        for field in fields {
            self.project(field, include)?;
        }
        Ok(self)
    }

    /// # Errors
    /// `OperatorMisuse` for an invalid slice, `LimitExceeded` or path errors.
    pub fn project_slice(&mut self, field: &str, slice: ArraySlice) -> Result<&mut Self> {
        let path = self.resolve(field)?;
        self.check_projection_room(&path)?;
        self.projection.slice(&path, slice)?;
        Ok(self)
    }

    pub fn batch_size(&mut self, n: i32) -> &mut Self {
        self.options.batch_size = Some(n);
        self
    }

    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.options.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.options.skip = Some(n);
        self
    }

    pub fn max_time(&mut self, duration: std::time::Duration) -> &mut Self {
        self.options.max_time_ms = Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.options.comment = Some(comment.into());
        self
    }

    pub fn hint(&mut self, index: Document) -> &mut Self {
        self.options.hint = Some(index);
        self
    }

    pub fn max_scan(&mut self, n: i64) -> &mut Self {
        self.options.set_modifier(MODIFIER_MAX_SCAN.to_string(), Bson::Int64(n));
        self
    }

    pub fn enable_snapshot_mode(&mut self) -> &mut Self {
        self.options.set_modifier(MODIFIER_SNAPSHOT.to_string(), Bson::Boolean(true));
        self
    }

    pub fn disable_snapshot_mode(&mut self) -> &mut Self {
        self.options.remove_modifier(MODIFIER_SNAPSHOT);
        self
    }

    pub fn enable_cursor_timeout(&mut self) -> &mut Self {
        self.options.no_cursor_timeout = Some(false);
        self
    }

    pub fn disable_cursor_timeout(&mut self) -> &mut Self {
        self.options.no_cursor_timeout = Some(true);
        self
    }

    pub fn query_non_primary(&mut self) -> &mut Self {
        self.read_preference(ReadPreference::SecondaryPreferred)
    }

    pub fn query_primary_only(&mut self) -> &mut Self {
        self.read_preference(ReadPreference::Primary)
    }

    pub fn read_preference(&mut self, rp: ReadPreference) -> &mut Self {
        self.options.read_preference = Some(rp);
        self
    }

    pub fn cursor_type(&mut self, t: CursorType) -> &mut Self {
        self.options.cursor_type = Some(t);
        self
    }

    pub fn collation(&mut self, collation: Collation) -> &mut Self {
        self.options.collation = Some(collation);
        self
    }

    pub fn modifier(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> &mut Self {
        self.options.set_modifier(key.into(), value.into());
        self
    }

    /// Overlays an options object; its set fields win over earlier mutator calls.
    pub fn apply_options(&mut self, options: &FindOptions) -> &mut Self {
        self.options.merge_from(options);
        self
    }

    /// Emits the filter document alone.
    ///
    /// # Errors
    /// Propagates criteria emission errors.
    pub fn filter_document(&self) -> Result<Document> {
        self.root.to_merged_document()
    }

    /// Freezes into an immutable descriptor. Freezing twice yields identical output.
    ///
    /// # Errors
    /// Propagates criteria emission errors.
    pub fn freeze(&self) -> Result<QueryDescriptor> {
        self.freeze_inner(self.options.clone())
    }

    /// Freezes with `options` applied over the query's own options.
    ///
    /// # Errors
    /// See [`Query::freeze`].
    pub fn freeze_with(&self, options: &FindOptions) -> Result<QueryDescriptor> {
        let mut merged = self.options.clone();
        merged.merge_from(options);
        self.freeze_inner(merged)
    }

    fn freeze_inner(&self, options: FindOptions) -> Result<QueryDescriptor> {
        let descriptor = QueryDescriptor {
            entity: self.entity.clone(),
            filter: self.filter_document()?,
            sort: self.sort.to_document(),
            projection: self.projection.to_document(),
            options,
        };
        log::debug!(
            "froze query on {}: filter={} sort={} projection={}",
            descriptor.entity,
            descriptor.filter,
            descriptor.sort,
            descriptor.projection
        );
        crate::dev6!(
            "{}",
            serde_json::json!({
                "event": "freeze",
                "entity": descriptor.entity,
                "filter_keys": descriptor.filter.len(),
                "sort_keys": descriptor.sort.len(),
                "projection_keys": descriptor.projection.len(),
                "validation": self.validation,
            })
        );
        Ok(descriptor)
    }
}

/// The frozen artifact handed to an executor: filter, sort and projection
/// documents plus options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    entity: String,
    filter: Document,
    sort: Document,
    projection: Document,
    options: FindOptions,
}

impl QueryDescriptor {
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn filter(&self) -> &Document {
        &self.filter
    }

    #[must_use]
    pub fn sort(&self) -> &Document {
        &self.sort
    }

    #[must_use]
    pub fn projection(&self) -> &Document {
        &self.projection
    }

    #[must_use]
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Filter, sort and projection as concatenated BSON.
    ///
    /// # Errors
    /// BSON serialisation errors.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.filter.to_vec()?;
        out.extend(self.sort.to_vec()?);
        out.extend(self.projection.to_vec()?);
        Ok(out)
    }

    /// A `find` command document for `collection`.
    #[must_use]
    pub fn to_find_command(&self, collection: &str) -> Document {
        let mut cmd = Document::new();
        cmd.insert("find", collection);
        cmd.insert("filter", self.filter.clone());
        if !self.sort.is_empty() {
            cmd.insert("sort", self.sort.clone());
        }
        if !self.projection.is_empty() {
            cmd.insert("projection", self.projection.clone());
        }
        for (k, v) in self.options.to_document() {
            cmd.insert(k, v);
        }
        if let Some(rp) = self.options.read_preference {
            let mut d = Document::new();
            d.insert("mode", rp.mode());
            cmd.insert("$readPreference", d);
        }
        cmd
    }
}
