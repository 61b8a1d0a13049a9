//! Query-criteria compiler: typed and string-predicate criteria, sort and
//! projection specifications, options, and the frozen query descriptor.

mod criteria;
mod cursor;
mod descriptor;
mod eval;
mod exec;
mod field;
mod operator;
mod options;
mod parse;
mod path;
mod projection;
mod sort;

pub use criteria::{
    Criteria, CriteriaContainer, ElemMatchCriteria, ElemMatchOperand, FieldCriteria, Join, is_operator_document,
};
pub use cursor::Cursor;
pub use descriptor::{Query, QueryDescriptor};
pub use eval::{apply_projection, compare_bson, compare_documents, lookup, matches};
pub use exec::{MemoryCollection, QueryExecutor};
pub use field::{CriteriaTarget, Detached, FieldEnd};
pub use operator::{Emitted, FilterOperator, emit};
pub use options::{Collation, CollationStrength, CursorType, FindOptions, ReadPreference};
pub use parse::parse_condition;
pub use path::{FieldPath, PATH_DELIMITER, PathResolver, PathSegment};
pub use projection::{ArraySlice, ProjectionEntry, ProjectionMode, ProjectionSpec};
pub use sort::{NATURAL_KEY, Sort, SortDirection, SortKey, SortSpec};
