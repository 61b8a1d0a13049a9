//! String predicate parsing: `"<field> <comparator>"` to a field name and operator.

use crate::errors::{QueryError, Result};

use super::operator::FilterOperator;

/// Maps a comparator token to its operator. Symbols match exactly; word
/// comparators are case-insensitive.
fn comparator(token: &str) -> Option<FilterOperator> {
    Some(match token {
        "=" | "==" => FilterOperator::Equal,
        "!=" | "<>" => FilterOperator::NotEqual,
        ">" => FilterOperator::GreaterThan,
        ">=" => FilterOperator::GreaterThanOrEqual,
        "<" => FilterOperator::LessThan,
        "<=" => FilterOperator::LessThanOrEqual,
        word => match word.to_ascii_lowercase().as_str() {
            "in" => FilterOperator::In,
            "nin" => FilterOperator::NotIn,
            "all" => FilterOperator::All,
            "size" => FilterOperator::Size,
            "exists" => FilterOperator::Exists,
            "type" => FilterOperator::Type,
            "elem" => FilterOperator::ElemMatch,
            _ => return None,
        },
    })
}

/// Splits a condition into its field name and operator.
///
/// The comparator must be a separate whitespace-delimited token; a missing
/// comparator means equality. `"height>"` is a field named `height>`, never
/// `height` with `>`.
///
/// # Errors
/// `MalformedPredicate` for an empty condition, an unknown comparator or
/// trailing tokens.
pub fn parse_condition(condition: &str) -> Result<(String, FilterOperator)> {
    let mut tokens = condition.split_whitespace();
    let Some(field) = tokens.next() else {
        return Err(QueryError::MalformedPredicate("empty condition".into()));
    };
    let op = match tokens.next() {
        None => FilterOperator::Equal,
        Some(tok) => comparator(tok).ok_or_else(|| {
            QueryError::MalformedPredicate(format!("unknown comparator '{tok}' in '{condition}'"))
        })?,
    };
    if let Some(extra) = tokens.next() {
        return Err(QueryError::MalformedPredicate(format!(
            "unexpected token '{extra}' in '{condition}'"
        )));
    }
    Ok((field.to_string(), op))
}
