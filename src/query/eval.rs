//! In-memory evaluation of filter, sort and projection documents.

use bson::{Bson, Document};
use std::cmp::Ordering;

use crate::errors::{QueryError, Result};

use super::projection::ArraySlice;

/// Whether `doc` satisfies the filter document `filter`.
///
/// # Errors
/// `Unsupported` for `$where`, geo operators and unknown operators;
/// `MalformedPredicate` for operands of the wrong shape.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, cond) in filter {
        let ok = match key.as_str() {
            "$and" => all_of(doc, key, cond)?,
            "$or" => any_of(doc, key, cond)?,
            "$nor" => !any_of(doc, key, cond)?,
            "$comment" => true,
            k if k.starts_with('$') => {
                return Err(QueryError::Unsupported(format!("top-level operator {k}")));
            }
            path => matches_field(doc, path, cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(key: &str, cond: &'a Bson) -> Result<impl Iterator<Item = Result<&'a Document>>> {
    let Bson::Array(list) = cond else {
        return Err(QueryError::MalformedPredicate(format!("{key} needs an array")));
    };
    Ok(list.iter().map(move |c| match c {
        Bson::Document(d) => Ok(d),
        _ => Err(QueryError::MalformedPredicate(format!("{key} entries must be documents"))),
    }))
}

fn all_of(doc: &Document, key: &str, cond: &Bson) -> Result<bool> {
    for clause in clauses(key, cond)? {
        if !matches(doc, clause?)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(doc: &Document, key: &str, cond: &Bson) -> Result<bool> {
    for clause in clauses(key, cond)? {
        if matches(doc, clause?)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_operator_doc(d: &Document) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn matches_field(doc: &Document, path: &str, cond: &Bson) -> Result<bool> {
    let values = lookup(doc, path);
    match cond {
        Bson::Document(ops) if is_operator_doc(ops) => eval_ops(&values, ops),
        literal => Ok(equals_any(&values, literal)),
    }
}

/// All values reached by `path`, descending through arrays of documents.
#[must_use]
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segs: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((first, rest)) = segs.split_first()
        && let Some(v) = doc.get(*first)
    {
        collect(v, rest, &mut out);
    }
    out
}

fn collect<'a>(cur: &'a Bson, rest: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((seg, tail)) = rest.split_first() else {
        out.push(cur);
        return;
    };
    match cur {
        Bson::Document(d) => {
            if let Some(v) = d.get(*seg) {
                collect(v, tail, out);
            }
        }
        Bson::Array(items) => {
            if let Ok(i) = seg.parse::<usize>() {
                if let Some(v) = items.get(i) {
                    collect(v, tail, out);
                }
            } else {
                for item in items.iter().filter(|i| matches!(i, Bson::Document(_))) {
                    collect(item, rest, out);
                }
            }
        }
        _ => {}
    }
}

fn values_eq(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

/// Equality with array containment: an array value matches a scalar target
/// if any element equals it.
fn equals_any(values: &[&Bson], target: &Bson) -> bool {
    if values.is_empty() {
        return matches!(target, Bson::Null);
    }
    values.iter().any(|v| {
        values_eq(v, target) || matches!(v, Bson::Array(items) if items.iter().any(|i| values_eq(i, target)))
    })
}

/// Each scalar value, with arrays expanded to their elements.
fn flattened<'a>(values: &[&'a Bson]) -> Vec<&'a Bson> {
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
        match v {
            Bson::Array(items) => out.extend(items.iter()),
            other => out.push(other),
        }
    }
    out
}

fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b))
        || matches!(
            (a, b),
            (Bson::String(_), Bson::String(_))
                | (Bson::Boolean(_), Bson::Boolean(_))
                | (Bson::DateTime(_), Bson::DateTime(_))
                | (Bson::ObjectId(_), Bson::ObjectId(_))
        )
}

fn compare_any(values: &[&Bson], target: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    flattened(values).into_iter().any(|v| comparable(v, target) && accept(compare_bson(v, target)))
}

fn operand_list<'a>(op: &str, operand: &'a Bson) -> Result<&'a [Bson]> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(QueryError::MalformedPredicate(format!("{op} needs an array"))),
    }
}

fn regex_any(values: &[&Bson], pattern: &str, case_insensitive: bool) -> bool {
    let Ok(re) = regex::RegexBuilder::new(pattern).case_insensitive(case_insensitive).build() else {
        log::warn!("invalid regex '{pattern}' never matches");
        return false;
    };
    flattened(values).into_iter().any(|v| matches!(v, Bson::String(s) if re.is_match(s)))
}

fn as_i64(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        #[allow(clippy::cast_possible_truncation)]
        Bson::Double(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

fn type_code(alias: &Bson) -> Result<Vec<u8>> {
    Ok(match alias {
        Bson::String(s) => match s.as_str() {
            "double" => vec![0x01],
            "string" => vec![0x02],
            "object" => vec![0x03],
            "array" => vec![0x04],
            "binData" => vec![0x05],
            "objectId" => vec![0x07],
            "bool" => vec![0x08],
            "date" => vec![0x09],
            "null" => vec![0x0A],
            "regex" => vec![0x0B],
            "int" => vec![0x10],
            "timestamp" => vec![0x11],
            "long" => vec![0x12],
            "decimal" => vec![0x13],
            "number" => vec![0x01, 0x10, 0x12, 0x13],
            other => return Err(QueryError::MalformedPredicate(format!("unknown $type alias '{other}'"))),
        },
        code => match as_i64(code).and_then(|c| u8::try_from(c).ok()) {
            Some(c) => vec![c],
            None => return Err(QueryError::MalformedPredicate(format!("bad $type operand {code}"))),
        },
    })
}

fn eval_ops(values: &[&Bson], ops: &Document) -> Result<bool> {
    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals_any(values, operand),
            "$ne" => !equals_any(values, operand),
            "$gt" => compare_any(values, operand, |o| o == Ordering::Greater),
            "$gte" => compare_any(values, operand, |o| o != Ordering::Less),
            "$lt" => compare_any(values, operand, |o| o == Ordering::Less),
            "$lte" => compare_any(values, operand, |o| o != Ordering::Greater),
            "$in" => operand_list(op, operand)?.iter().any(|t| equals_any(values, t)),
            "$nin" => !operand_list(op, operand)?.iter().any(|t| equals_any(values, t)),
            "$exists" => {
                let want = match operand {
                    Bson::Boolean(b) => *b,
                    other => as_i64(other).is_some_and(|n| n != 0),
                };
                values.is_empty() != want
            }
            "$size" => {
                let n = as_i64(operand).and_then(|n| usize::try_from(n).ok());
                values.iter().any(|v| matches!(v, Bson::Array(items) if Some(items.len()) == n))
            }
            "$all" => {
                let wanted = operand_list(op, operand)?;
                !wanted.is_empty() && wanted.iter().all(|t| equals_any(values, t))
            }
            "$elemMatch" => {
                let Bson::Document(sub) = operand else {
                    return Err(QueryError::MalformedPredicate("$elemMatch needs a document".into()));
                };
                elem_match_any(values, sub)?
            }
            "$not" => match operand {
                Bson::Document(inner) if is_operator_doc(inner) => !eval_ops(values, inner)?,
                literal => !equals_any(values, literal),
            },
            "$regex" => {
                let ci = matches!(ops.get("$options"), Some(Bson::String(o)) if o.contains('i'));
                let Bson::String(pattern) = operand else {
                    return Err(QueryError::MalformedPredicate("$regex needs a string".into()));
                };
                regex_any(values, pattern, ci)
            }
            "$options" => true,
            "$mod" => {
                let list = operand_list(op, operand)?;
                let (Some(d), Some(r)) = (list.first().and_then(as_i64), list.get(1).and_then(as_i64)) else {
                    return Err(QueryError::MalformedPredicate("$mod needs [divisor, remainder]".into()));
                };
                if d == 0 {
                    return Err(QueryError::MalformedPredicate("$mod divisor is zero".into()));
                }
                flattened(values).into_iter().filter_map(as_i64).any(|v| v % d == r)
            }
            "$type" => {
                let codes = type_code(operand)?;
                values.iter().any(|v| codes.contains(&(v.element_type() as u8)))
            }
            other => return Err(QueryError::Unsupported(format!("operator {other}"))),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True if one array element satisfies every condition of `sub`.
fn elem_match_any(values: &[&Bson], sub: &Document) -> Result<bool> {
    for v in values {
        let Bson::Array(items) = v else { continue };
        for item in items {
            let hit = match item {
                Bson::Document(d) if !is_operator_doc(sub) => matches(d, sub)?,
                _ if is_operator_doc(sub) => eval_ops(&[item], sub)?,
                _ => false,
            };
            if hit {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.cmp(y),
        (T::ObjectId(x), T::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Store sort order across types: null < numbers < strings < documents < arrays < ...
fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::String(_) | T::Symbol(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) => 12,
        T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 13,
        T::MaxKey => 255,
    }
}

/// Compares the first value of `path` in each document; a missing value sorts first.
#[must_use]
pub fn compare_field(a: &Document, b: &Document, path: &str) -> Ordering {
    match (lookup(a, path).first(), lookup(b, path).first()) {
        (Some(x), Some(y)) => compare_bson(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Orders two documents by a sort document such as `{"w": 1, "h": -1}`.
/// `$natural` is ignored here; callers handle it as insertion order.
#[must_use]
pub fn compare_documents(sort: &Document, a: &Document, b: &Document) -> Ordering {
    for (path, dir) in sort {
        if path.starts_with('$') {
            continue;
        }
        let ord = compare_field(a, b, path);
        let ord = if as_i64(dir).is_some_and(|d| d < 0) { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn parse_slice(v: &Bson) -> Option<ArraySlice> {
    let Bson::Document(d) = v else { return None };
    match d.get("$slice")? {
        Bson::Array(pair) => {
            let skip = pair.first().and_then(as_i64).and_then(|n| i32::try_from(n).ok())?;
            let limit = pair.get(1).and_then(as_i64).and_then(|n| i32::try_from(n).ok())?;
            Some(ArraySlice::with_skip(skip, limit))
        }
        n => as_i64(n).and_then(|n| i32::try_from(n).ok()).map(ArraySlice::new),
    }
}

fn get_path<'a>(root: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.get(seg);
        }
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

fn set_path(root: &mut Document, path: &str, value: Bson) {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            cur.insert(seg, value);
            return;
        }
        if !matches!(cur.get(seg), Some(Bson::Document(_))) {
            cur.insert(seg, Document::new());
        }
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return,
        }
    }
}

fn remove_path(root: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            root.remove(path);
        }
        Some((head, tail)) => {
            if let Some(Bson::Document(d)) = root.get_mut(head) {
                remove_path(d, tail);
            }
        }
    }
}

fn apply_slice(out: &mut Document, path: &str, slice: ArraySlice) {
    if let Some(Bson::Array(items)) = get_path(out, path) {
        let sliced = slice.apply(items);
        set_path(out, path, Bson::Array(sliced));
    }
}

/// Applies a projection document: `1`/`0` flags plus `$slice` directives.
#[must_use]
pub fn apply_projection(doc: &Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return doc.clone();
    }
    let flag = |v: &Bson| match v {
        Bson::Boolean(b) => Some(*b),
        other => as_i64(other).map(|n| n != 0),
    };
    let inclusion = projection.iter().any(|(k, v)| k != "_id" && flag(v) == Some(true));
    let mut out = if inclusion {
        let mut out = Document::new();
        if projection.get("_id").and_then(flag) != Some(false)
            && let Some(id) = doc.get("_id")
        {
            out.insert("_id", id.clone());
        }
        for (k, v) in projection {
            if k != "_id" && (flag(v) == Some(true) || parse_slice(v).is_some())
                && let Some(found) = get_path(doc, k)
            {
                set_path(&mut out, k, found.clone());
            }
        }
        out
    } else {
        let mut out = doc.clone();
        for (k, v) in projection {
            if flag(v) == Some(false) {
                remove_path(&mut out, k);
            }
        }
        out
    };
    for (k, v) in projection {
        if let Some(slice) = parse_slice(v) {
            apply_slice(&mut out, k, slice);
        }
    }
    out
}
