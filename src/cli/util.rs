use bson::Bson;

use crate::query::parse_condition;
use crate::utils::json::parse_json_to_bson;

/// Splits a `--filter` argument into a condition and its JSON value.
///
/// Accepted shapes: `field=<json>`, `field <symbol><json>` (`height >=4`,
/// `name !="x"`) and `field <word> <json>` (`tags in ["a"]`). The returned
/// condition always passes [`parse_condition`].
#[must_use]
pub fn split_filter_arg(arg: &str) -> Option<(String, Bson)> {
    let arg = arg.trim();
    let first_space = arg.find(char::is_whitespace);
    let first_eq = arg.find('=');
    let (cond, value) = match (first_space, first_eq) {
        (None, Some(i)) => (arg[..i].to_string(), &arg[i + 1..]),
        (Some(s), Some(e)) if e < s => (arg[..e].to_string(), &arg[e + 1..]),
        (Some(s), _) => {
            let (field, rest) = (&arg[..s], arg[s..].trim_start());
            let op_len = rest.find(|c: char| !matches!(c, '=' | '!' | '<' | '>')).unwrap_or(rest.len());
            let (op, value) = if op_len > 0 {
                rest.split_at(op_len)
            } else {
                let end = rest.find(|c: char| c.is_whitespace() || c == '=').unwrap_or(rest.len());
                let (word, tail) = rest.split_at(end);
                let tail = tail.trim_start();
                (word, tail.strip_prefix('=').unwrap_or(tail))
            };
            (format!("{field} {op}"), value)
        }
        (None, None) => return None,
    };
    parse_condition(&cond).ok()?;
    let value = parse_json_to_bson(value.trim()).ok()?;
    Some((cond, value))
}

/// Parses `"field"`, `"field:1"` or `"field:0"`; a bare field is included.
#[must_use]
pub fn parse_project_arg(arg: &str) -> Option<(String, bool)> {
    match arg.rsplit_once(':') {
        Some((field, "1" | "true")) if !field.is_empty() => Some((field.to_string(), true)),
        Some((field, "0" | "false")) if !field.is_empty() => Some((field.to_string(), false)),
        Some(_) => None,
        None if !arg.is_empty() => Some((arg.to_string(), true)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_arg_keeps_comparators() {
        assert_eq!(split_filter_arg("height >=4"), Some(("height >=".into(), Bson::Int32(4))));
        assert_eq!(split_filter_arg("height ==4"), Some(("height ==".into(), Bson::Int32(4))));
        assert_eq!(split_filter_arg("name=\"a=b\""), Some(("name".into(), Bson::String("a=b".into()))));
        assert_eq!(split_filter_arg("height >"), None);
        assert_eq!(split_filter_arg("name !=\"x\""), Some(("name !=".into(), Bson::String("x".into()))));
        assert_eq!(
            split_filter_arg("tags in [1]"),
            Some(("tags in".into(), Bson::Array(vec![Bson::Int32(1)])))
        );
        assert_eq!(split_filter_arg("name=\"a b\""), Some(("name".into(), Bson::String("a b".into()))));
        assert_eq!(split_filter_arg("height >== 4"), None);
    }

    #[test]
    fn project_arg_parsing() {
        assert_eq!(parse_project_arg("w"), Some(("w".into(), true)));
        assert_eq!(parse_project_arg("w:0"), Some(("w".into(), false)));
        assert_eq!(parse_project_arg("w:x"), None);
        assert_eq!(parse_project_arg(""), None);
    }
}
