//! Recursive field differ
//!
//! Walks two flattened resource records over the union of their field paths
//! and emits one entry per differing leaf. Paths use dotted/bracketed
//! notation (`policy.statements[0].effect`). Lists are compared strictly by
//! position unless the caller explicitly names a match key for that path;
//! length mismatches surface as a synthetic `<field>.length` leaf.
//!
//! Emission order is deterministic: record_a's fields in their order of
//! appearance, then fields only present in record_b.

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Records nested deeper than this are treated as malformed
const MAX_DEPTH: usize = 64;

/// One leaf-level difference. `None` on either side means the field is
/// missing from that record (distinct from an explicit JSON null).
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub path: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Differ tunables, borrowed from the run's `ComparisonConfig`
#[derive(Debug, Clone, Copy)]
pub struct DiffOptions<'a> {
    /// Exact dotted paths or terminal field names to skip entirely
    pub excluded_fields: &'a BTreeSet<String>,
    /// Decimal places numbers are rounded to before comparing (`None` = exact)
    pub significant_digits: Option<u32>,
    /// Index-free list path -> element field used for key-based matching
    pub list_key_fields: &'a BTreeMap<String, String>,
}

/// Compare two records field-by-field
pub fn diff_records(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    options: &DiffOptions,
) -> Result<Vec<DiffEntry>> {
    let mut entries = Vec::new();
    walk_maps(a, b, "", "", 0, options, &mut entries)?;
    Ok(entries)
}

fn walk_maps(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    prefix: &str,
    canonical_prefix: &str,
    depth: usize,
    options: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) -> Result<()> {
    if depth > MAX_DEPTH {
        bail!("record nesting exceeds {} levels at '{}'", MAX_DEPTH, prefix);
    }

    // Union of keys: a's in appearance order, then b-only keys.
    let mut keys: Vec<&str> = a.keys().map(|k| k.as_str()).collect();
    keys.extend(b.keys().filter(|k| !a.contains_key(*k)).map(|k| k.as_str()));

    for key in keys {
        let path = join_path(prefix, key);
        if options.excluded_fields.contains(key) || options.excluded_fields.contains(&path) {
            continue;
        }
        let canonical = join_path(canonical_prefix, key);
        match (a.get(key), b.get(key)) {
            (Some(va), Some(vb)) => {
                diff_values(va, vb, &path, &canonical, depth + 1, options, out)?;
            }
            (Some(va), None) => out.push(DiffEntry {
                path,
                old: Some(va.clone()),
                new: None,
            }),
            (None, Some(vb)) => out.push(DiffEntry {
                path,
                old: None,
                new: Some(vb.clone()),
            }),
            (None, None) => {}
        }
    }
    Ok(())
}

fn diff_values(
    va: &Value,
    vb: &Value,
    path: &str,
    canonical: &str,
    depth: usize,
    options: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) -> Result<()> {
    if depth > MAX_DEPTH {
        bail!("record nesting exceeds {} levels at '{}'", MAX_DEPTH, path);
    }
    match (va, vb) {
        (Value::Object(ma), Value::Object(mb)) => {
            walk_maps(ma, mb, path, canonical, depth, options, out)
        }
        (Value::Array(la), Value::Array(lb)) => {
            diff_lists(la, lb, path, canonical, depth, options, out)
        }
        _ => {
            if !values_equal(va, vb, options.significant_digits) {
                out.push(DiffEntry {
                    path: path.to_string(),
                    old: Some(va.clone()),
                    new: Some(vb.clone()),
                });
            }
            Ok(())
        }
    }
}

fn diff_lists(
    la: &[Value],
    lb: &[Value],
    path: &str,
    canonical: &str,
    depth: usize,
    options: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) -> Result<()> {
    if let Some(key_field) = options.list_key_fields.get(canonical) {
        if let (Some(keyed_a), Some(keyed_b)) = (key_elements(la, key_field), key_elements(lb, key_field))
        {
            return diff_keyed_lists(&keyed_a, &keyed_b, key_field, path, canonical, depth, options, out);
        }
        // Elements lack the configured key; fall back to positional
        // comparison rather than guessing a match.
        tracing::debug!(
            "list '{}' has no usable '{}' key on every element, comparing by position",
            path,
            key_field
        );
    }

    let common = la.len().min(lb.len());
    for i in 0..common {
        let element_path = format!("{}[{}]", path, i);
        diff_values(&la[i], &lb[i], &element_path, canonical, depth + 1, options, out)?;
    }
    if la.len() != lb.len() {
        out.push(DiffEntry {
            path: format!("{}.length", path),
            old: Some(Value::from(la.len())),
            new: Some(Value::from(lb.len())),
        });
    }
    Ok(())
}

/// Index every element by its scalar key value, preserving first-appearance
/// order. Returns `None` unless every element is an object carrying the key.
fn key_elements<'a>(
    list: &'a [Value],
    key_field: &str,
) -> Option<Vec<(String, &'a Value)>> {
    let mut keyed = Vec::with_capacity(list.len());
    for element in list {
        let obj = element.as_object()?;
        let key = match obj.get(key_field)? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        keyed.push((key, element));
    }
    Some(keyed)
}

#[allow(clippy::too_many_arguments)]
fn diff_keyed_lists(
    keyed_a: &[(String, &Value)],
    keyed_b: &[(String, &Value)],
    key_field: &str,
    path: &str,
    canonical: &str,
    depth: usize,
    options: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) -> Result<()> {
    let map_b: BTreeMap<&str, &Value> = keyed_b.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let map_a: BTreeMap<&str, &Value> = keyed_a.iter().map(|(k, v)| (k.as_str(), *v)).collect();

    for (key, va) in keyed_a {
        let element_path = format!("{}[{}={}]", path, key_field, key);
        match map_b.get(key.as_str()) {
            Some(vb) => diff_values(va, vb, &element_path, canonical, depth + 1, options, out)?,
            None => out.push(DiffEntry {
                path: element_path,
                old: Some((*va).clone()),
                new: None,
            }),
        }
    }
    for (key, vb) in keyed_b {
        if !map_a.contains_key(key.as_str()) {
            out.push(DiffEntry {
                path: format!("{}[{}={}]", path, key_field, key),
                old: None,
                new: Some((*vb).clone()),
            });
        }
    }
    Ok(())
}

/// Scalar equality. Numbers compare numerically (so `30` equals `30.0`),
/// rounded to `significant_digits` decimal places when configured.
fn values_equal(a: &Value, b: &Value, significant_digits: Option<u32>) -> bool {
    if let (Value::Number(na), Value::Number(nb)) = (a, b) {
        return match (na.as_f64(), nb.as_f64()) {
            (Some(fa), Some(fb)) => match significant_digits {
                Some(digits) => {
                    let factor = 10f64.powi(digits as i32);
                    (fa * factor).round() == (fb * factor).round()
                }
                None => fa == fb,
            },
            _ => na == nb,
        };
    }
    a == b
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Recursively drop excluded fields from a record snapshot. Used when a
/// whole resource is reported as added/removed so its embedded copy matches
/// what the differ would have looked at.
pub fn strip_excluded(map: &Map<String, Value>, excluded: &BTreeSet<String>) -> Map<String, Value> {
    let mut result = Map::new();
    for (key, value) in map {
        if excluded.contains(key.as_str()) {
            continue;
        }
        result.insert(key.clone(), strip_excluded_value(value, excluded));
    }
    result
}

fn strip_excluded_value(value: &Value, excluded: &BTreeSet<String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(strip_excluded(map, excluded)),
        Value::Array(list) => Value::Array(
            list.iter()
                .map(|v| strip_excluded_value(v, excluded))
                .collect(),
        ),
        other => other.clone(),
    }
}
