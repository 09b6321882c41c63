//! DepURL parsing, validation, and canonicalization.
//!
//! DepURLs are the PEP 725 identifiers for non-PyPI dependencies, e.g.
//! `dep:generic/unixodbc` or `dep:virtual/compiler/c`. The codec reduces them
//! to "simple names" used as keys into `[tool.wads.external.ops]`.

/// Scheme prefix every DepURL must carry.
pub const SCHEME: &str = "dep:";

/// Check that a string looks like a well-formed DepURL.
///
/// Must start with `dep:` and, once version/query/fragment suffixes are
/// removed, split into at least `type/name` with no empty segments.
pub fn is_valid(depurl: &str) -> bool {
    let Some(rest) = depurl.strip_prefix(SCHEME) else {
        return false;
    };
    let path = strip_suffixes(rest);
    let mut segments = 0;
    for segment in path.split('/') {
        if segment.is_empty() {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Convert a DepURL to the simplified name used for ops lookups.
///
/// `dep:generic/unixodbc` -> `unixodbc`, `dep:virtual/compiler/c` ->
/// `compiler-c`, `dep:generic/libffi@>=3.0` -> `libffi`. Does not validate:
/// malformed input degrades to a hyphen-joined best effort, so callers that
/// need strictness must gate on [`is_valid`] first.
pub fn to_simple_name(depurl: &str) -> String {
    let rest = depurl.strip_prefix(SCHEME).unwrap_or(depurl);
    let path = strip_suffixes(rest);
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [_, name] => (*name).to_string(),
        [_, category, name] => format!("{category}-{name}"),
        _ => segments.join("-"),
    }
}

/// Drop the version (`@...`), query (`?...`), and fragment (`#...`) suffixes,
/// in that order.
fn strip_suffixes(path: &str) -> &str {
    let path = truncate_at(path, '@');
    let path = truncate_at(path, '?');
    truncate_at(path, '#')
}

fn truncate_at(s: &str, delimiter: char) -> &str {
    match s.find(delimiter) {
        Some(index) => &s[..index],
        None => s,
    }
}
