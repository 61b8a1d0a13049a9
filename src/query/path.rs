//! Resolution of dotted field paths against mapping metadata.

use crate::errors::{QueryError, Result};
use crate::schema::{DeclaredType, ID_WIRE_NAME, SchemaService};

pub const PATH_DELIMITER: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub logical: String,
    pub wire: String,
    /// `None` when the segment was not validated.
    pub declared_type: Option<DeclaredType>,
    pub array: bool,
    pub reference: bool,
}

impl PathSegment {
    fn raw(seg: &str) -> Self {
        Self { logical: seg.to_string(), wire: seg.to_string(), declared_type: None, array: false, reference: false }
    }
}

/// A field path with its wire-level dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    wire: String,
    segments: Vec<PathSegment>,
    validated: bool,
}

impl FieldPath {
    /// Pass-through path used when validation is disabled.
    #[must_use]
    pub fn unvalidated(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            wire: raw.to_string(),
            segments: raw.split(PATH_DELIMITER).map(PathSegment::raw).collect(),
            validated: false,
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn wire_name(&self) -> &str {
        &self.wire
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    #[must_use]
    pub fn terminal(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.wire == ID_WIRE_NAME
    }

    /// Embedded type of the terminal segment, the scope for `$elemMatch` sub-queries.
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        self.terminal().and_then(|s| s.declared_type.as_ref()).and_then(DeclaredType::embedded_type)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire)
    }
}

enum Scope<'a> {
    Mapped(&'a str),
    Reference(String),
    Opaque,
    Scalar(String),
}

fn scope_for(declared: &DeclaredType) -> Scope<'_> {
    match declared {
        DeclaredType::Embedded(name) => Scope::Mapped(name),
        other if other.is_opaque_container() => Scope::Opaque,
        other => Scope::Scalar(other.type_name().to_string()),
    }
}

fn is_identifier_alias(seg: &str, declared_name: &str) -> bool {
    seg == ID_WIRE_NAME || seg == "id" || seg == declared_name
}

pub struct PathResolver<'a> {
    schema: &'a dyn SchemaService,
    max_depth: usize,
}

impl<'a> PathResolver<'a> {
    pub fn new(schema: &'a dyn SchemaService, max_depth: usize) -> Self {
        Self { schema, max_depth }
    }

    /// Resolves `raw` against `entity`.
    ///
    /// With validation disabled the raw path passes through unchanged.
    ///
    /// # Errors
    /// `UnknownField` for a segment matching neither a logical nor a wire name,
    /// `ReferenceDotNotation` for a path continuing past a reference,
    /// `LimitExceeded` for paths deeper than the configured maximum.
    pub fn resolve(&self, entity: &str, raw: &str, validation: bool) -> Result<FieldPath> {
        if raw.trim().is_empty() {
            return Err(QueryError::MalformedPredicate("empty field path".into()));
        }
        let parts: Vec<&str> = raw.split(PATH_DELIMITER).collect();
        if parts.len() > self.max_depth {
            return Err(QueryError::LimitExceeded(format!(
                "path '{raw}' has {} segments (max {})",
                parts.len(),
                self.max_depth
            )));
        }
        if !validation {
            return Ok(FieldPath::unvalidated(raw));
        }
        if !self.schema.contains(entity) {
            return Err(QueryError::UnknownEntity(entity.to_string()));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(QueryError::MalformedPredicate(format!("empty segment in path '{raw}'")));
        }

        let mut segments = Vec::with_capacity(parts.len());
        let mut scope = Scope::Mapped(entity);
        for (i, &seg) in parts.iter().enumerate() {
            scope = match scope {
                Scope::Mapped(ty) => {
                    let id = if i == 0 { self.schema.identifier(ty) } else { None };
                    if let Some(id) = id.filter(|id| is_identifier_alias(seg, &id.name)) {
                        segments.push(PathSegment {
                            logical: id.name.clone(),
                            wire: ID_WIRE_NAME.to_string(),
                            declared_type: Some(id.declared_type.clone()),
                            array: false,
                            reference: false,
                        });
                        scope_for(&id.declared_type)
                    } else if let Some(p) = self.schema.lookup_property(ty, seg) {
                        segments.push(PathSegment {
                            logical: p.name.clone(),
                            wire: p.stored_name().to_string(),
                            declared_type: Some(p.declared_type.clone()),
                            array: p.array,
                            reference: p.reference,
                        });
                        if p.reference { Scope::Reference(p.name.clone()) } else { scope_for(&p.declared_type) }
                    } else {
                        return Err(QueryError::UnknownField {
                            segment: seg.to_string(),
                            type_name: ty.to_string(),
                        });
                    }
                }
                Scope::Reference(field) => {
                    return Err(QueryError::ReferenceDotNotation { path: raw.to_string(), field });
                }
                Scope::Opaque => {
                    segments.push(PathSegment::raw(seg));
                    Scope::Opaque
                }
                Scope::Scalar(type_name) => {
                    return Err(QueryError::UnknownField { segment: seg.to_string(), type_name });
                }
            };
        }

        let wire = segments.iter().map(|s| s.wire.as_str()).collect::<Vec<_>>().join(".");
        log::trace!("resolved '{raw}' on {entity} to '{wire}'");
        Ok(FieldPath { raw: raw.to_string(), wire, segments, validated: true })
    }
}
