//! Structured value helpers
//!
//! All runtime payloads are `serde_json::Value`. These helpers give the
//! interpreter, triggers, and workflows one shared notion of dotted-path
//! lookup, string coercion, and template substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Nested key-value data decoded from `.arc` structured literals.
pub type StructuredValue = Value;

/// Ordered string-keyed mapping used for arguments and result maps.
pub type ValueMap = Map<String, Value>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").expect("Invalid placeholder regex"));

/// Resolve a dotted path such as `foundation.cosmology` against a value.
///
/// Object segments are looked up by key; array segments must be decimal
/// indices. An empty path resolves to the value itself.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a value as text the way template arguments are rendered.
///
/// Strings are emitted without quotes, whole numbers without a fractional
/// part, arrays as comma-joined elements, and objects as compact JSON.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i64),
        Some(f) => format!("{}", f),
        None => n.to_string(),
    }
}

/// Interpret a value as a number: numbers directly, numeric strings parsed.
pub fn coerce_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Replace `${key}` placeholders with string-coerced argument values.
///
/// Substitution is a single left-to-right pass: text produced by an argument
/// value is never rescanned. Placeholders without a matching argument are
/// left verbatim.
pub fn substitute_placeholders(template: &str, args: &ValueMap) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match args.get(&caps[1]) {
            Some(value) => coerce_to_string(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names referenced by a template, in order of appearance.
pub fn placeholder_names(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
