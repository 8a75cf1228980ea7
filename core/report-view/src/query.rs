//! FILENAME: core/report-view/src/query.rs
//! Control query parameters and canonical query-string building.
//!
//! Generated links must be stable and testable, so the query string is
//! always emitted with sorted keys and form-style percent encoding.

use std::collections::BTreeMap;

/// "Show all rows" flag (presence only).
pub const ALL_VAR: &str = "all";
/// Ordering spec: dot-separated column tokens, `-` prefix = descending.
pub const ORDER_VAR: &str = "o";
/// Zero-based page number.
pub const PAGE_VAR: &str = "p";
/// Export trigger (presence only).
pub const EXPORT_VAR: &str = "e";

/// Parameters reserved for list control; the form layer excludes these
/// from filter data.
pub const CONTROL_VARS: [&str; 4] = [ALL_VAR, ORDER_VAR, PAGE_VAR, EXPORT_VAR];

/// The request's query parameters. A BTreeMap keeps keys sorted, which
/// makes every generated query string canonical.
pub type RequestParams = BTreeMap<String, String>;

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// Form-style component encoding: unreserved bytes pass through, space
/// becomes `+`, everything else is percent-encoded.
pub fn urlencode_component(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        if is_unreserved(byte) {
            encoded.push(byte as char);
        } else if byte == b' ' {
            encoded.push('+');
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// Builds a canonical `?a=1&b=2` string from the current parameters.
///
/// `remove` drops every key starting with one of the given prefixes,
/// then `new_params` is applied: `Some(value)` overrides, `None`
/// deletes the key outright.
pub fn build_query_string(
    params: &RequestParams,
    new_params: &[(&str, Option<&str>)],
    remove: &[&str],
) -> String {
    let mut merged = params.clone();
    for prefix in remove {
        merged.retain(|key, _| !key.starts_with(prefix));
    }
    for (key, value) in new_params {
        match value {
            Some(value) => {
                merged.insert(key.to_string(), value.to_string());
            }
            None => {
                merged.remove(*key);
            }
        }
    }
    let parts: Vec<String> = merged
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode_component(k), urlencode_component(v)))
        .collect();
    format!("?{}", parts.join("&"))
}
