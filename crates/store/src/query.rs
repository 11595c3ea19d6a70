//! Evaluation of MongoDB-style query documents against JSON values.
//!
//! Supported: implicit equality, dotted paths with array traversal,
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists $regex/$options $not`,
//! and the logical `$and $or $nor`. Anything else is rejected the way the
//! server would reject it.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::StoreError;

/// Compiled-program ceiling for `$regex` patterns evaluated in process.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Returns whether `doc` satisfies `filter`.
pub(crate) fn matches(doc: &Value, filter: &Value) -> Result<bool, StoreError> {
    let Value::Object(clauses) = filter else {
        return Err(StoreError::rejected("filter must be an object"));
    };

    let mut all = true;
    for (key, cond) in clauses {
        let ok = match key.as_str() {
            "$and" => logical_branches(doc, cond, "$and")?.iter().all(|b| *b),
            "$or" => logical_branches(doc, cond, "$or")?.iter().any(|b| *b),
            "$nor" => !logical_branches(doc, cond, "$nor")?.iter().any(|b| *b),
            op if op.starts_with('$') => {
                return Err(StoreError::rejected(format!(
                    "unknown top level operator: {op}"
                )))
            }
            path => field_matches(&resolve(doc, path), cond)?,
        };
        all &= ok;
    }
    Ok(all)
}

fn logical_branches(doc: &Value, cond: &Value, op: &str) -> Result<Vec<bool>, StoreError> {
    let branches = match cond {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(StoreError::rejected(format!(
                "{op} must be a nonempty array"
            )))
        }
    };
    branches.iter().map(|branch| matches(doc, branch)).collect()
}

/// Every value reachable at `path`. Arrays along the way are traversed
/// element-wise, and numeric segments also index into them.
fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    if let Ok(idx) = segment.parse::<usize>() {
                        if let Some(child) = items.get(idx) {
                            next.push(child);
                        }
                    }
                    for item in items {
                        if let Value::Object(map) = item {
                            if let Some(child) = map.get(segment) {
                                next.push(child);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

fn is_operator_doc(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn field_matches(values: &[&Value], cond: &Value) -> Result<bool, StoreError> {
    match cond {
        Value::Object(ops) if is_operator_doc(ops) => operators_match(values, ops),
        literal => Ok(equals_any(values, literal)),
    }
}

/// Candidates plus the elements of any array candidate.
fn expand<'a>(values: &[&'a Value]) -> Vec<&'a Value> {
    let mut out = Vec::with_capacity(values.len());
    for value in values.iter().copied() {
        out.push(value);
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
    }
    out
}

fn equals_any(values: &[&Value], literal: &Value) -> bool {
    if values.is_empty() {
        return literal.is_null();
    }
    expand(values).iter().any(|v| values_equal(v, literal))
}

fn operators_match(values: &[&Value], ops: &Map<String, Value>) -> Result<bool, StoreError> {
    let mut all = true;

    if let Some(pattern) = ops.get("$regex") {
        let options = match ops.get("$options") {
            None => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err(StoreError::rejected("$options has to be a string")),
        };
        let re = compile_regex(pattern, options)?;
        all &= regex_matches(values, &re);
    } else if ops.contains_key("$options") {
        return Err(StoreError::rejected("$options needs a $regex"));
    }

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$regex" | "$options" => continue,
            "$eq" => equals_any(values, operand),
            "$ne" => !equals_any(values, operand),
            "$gt" => compare_any(values, operand, |o| o == Ordering::Greater),
            "$gte" => compare_any(values, operand, |o| o != Ordering::Less),
            "$lt" => compare_any(values, operand, |o| o == Ordering::Less),
            "$lte" => compare_any(values, operand, |o| o != Ordering::Greater),
            "$in" => in_list(values, operand, "$in")?,
            "$nin" => !in_list(values, operand, "$nin")?,
            "$exists" => {
                let wanted = truthy(operand);
                values.is_empty() != wanted
            }
            "$not" => match operand {
                Value::Object(inner) if is_operator_doc(inner) => {
                    !operators_match(values, inner)?
                }
                _ => return Err(StoreError::rejected("$not needs a regex or a document")),
            },
            other => return Err(StoreError::rejected(format!("unknown operator: {other}"))),
        };
        all &= ok;
    }
    Ok(all)
}

fn in_list(values: &[&Value], operand: &Value, op: &str) -> Result<bool, StoreError> {
    let Value::Array(items) = operand else {
        return Err(StoreError::rejected(format!("{op} needs an array")));
    };
    Ok(items.iter().any(|item| equals_any(values, item)))
}

fn compare_any(values: &[&Value], operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    expand(values)
        .iter()
        .any(|v| compare(v, operand).is_some_and(&accept))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

fn compile_regex(pattern: &Value, options: &str) -> Result<Regex, StoreError> {
    let Value::String(source) = pattern else {
        return Err(StoreError::rejected("$regex has to be a string"));
    };
    let mut builder = RegexBuilder::new(source);
    builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(StoreError::rejected(format!(
                    "invalid flag in regex options: {other}"
                )))
            }
        };
    }
    builder
        .build()
        .map_err(|e| StoreError::rejected(format!("invalid regex: {e}")))
}

fn regex_matches(values: &[&Value], re: &Regex) -> bool {
    expand(values)
        .iter()
        .any(|v| v.as_str().is_some_and(|s| re.is_match(s)))
}

/// Equality with numeric coercion (`1` equals `1.0`), applied recursively.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, vx), (ky, vy))| kx == ky && values_equal(vx, vy))
        }
        _ => a == b,
    }
}

/// Ordering within a type class; values of different classes never compare.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
