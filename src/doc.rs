//! Path-query helpers over a parsed TOML document.
//!
//! Configuration accessors never fail on missing keys: every projection is a
//! "get with default" chain over the nested value tree, made explicit here
//! instead of scattering optional lookups through the model.

use std::collections::BTreeMap;
use toml::value::Table;
use toml::Value;

/// Walk `path` through nested tables, returning the value at the end.
pub fn get<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = doc;
    for key in path {
        node = node.as_table()?.get(*key)?;
    }
    Some(node)
}

/// Table at `path`, or `None` when absent or not a table.
pub fn table_at<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Table> {
    get(doc, path)?.as_table()
}

/// String at `path`, or `default` when absent.
pub fn str_or(doc: &Value, path: &[&str], default: &str) -> String {
    get(doc, path)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Boolean at `path`, or `default` when absent.
pub fn bool_or(doc: &Value, path: &[&str], default: bool) -> bool {
    get(doc, path).and_then(Value::as_bool).unwrap_or(default)
}

/// Integer at `path`, or `default` when absent.
pub fn int_or(doc: &Value, path: &[&str], default: i64) -> i64 {
    get(doc, path).and_then(Value::as_integer).unwrap_or(default)
}

/// String sequence at `path`, or `default` when absent.
///
/// Non-string elements are skipped rather than erroring; the model is a
/// best-effort view over hand-written configuration.
pub fn str_seq_or(doc: &Value, path: &[&str], default: &[&str]) -> Vec<String> {
    match get(doc, path).and_then(Value::as_array) {
        Some(items) => str_seq(items),
        None => default.iter().map(|s| (*s).to_string()).collect(),
    }
}

/// String-to-string mapping at `path`, empty when absent.
pub fn str_map_or(doc: &Value, path: &[&str]) -> BTreeMap<String, String> {
    let Some(table) = table_at(doc, path) else {
        return BTreeMap::new();
    };
    table
        .iter()
        .map(|(key, value)| (key.clone(), scalar_to_string(value)))
        .collect()
}

/// Collect the string elements of a TOML array.
pub fn str_seq(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Render a scalar the way it should appear in generated text (strings
/// unquoted, other scalars via their TOML form).
fn scalar_to_string(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
