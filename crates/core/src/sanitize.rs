//! Argument sanitisation for model-produced tool calls.
//!
//! The catalog rejects certain control characters (notably NUL) that a
//! model can emit inside free-text fields. Cleaning happens here, on the
//! parsed argument value, so every tool benefits uniformly no matter which
//! one is called.

use serde_json::Value;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Normalise to NFC, then drop characters below U+0020 except `\n`, `\r`
/// and `\t`.
pub fn strip_control_chars(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let cleaned: String = value
        .nfc()
        .filter(|&c| c >= ' ' || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    if cleaned != value {
        debug!(original = ?value, cleaned = ?cleaned, "Sanitised string");
    }
    cleaned
}

/// Recursively sanitise a JSON value: object values and array elements are
/// visited in place of structure, strings are cleaned, object keys and
/// non-string leaves pass through unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, sanitize_value(val)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::String(s) => Value::String(strip_control_chars(&s)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nul_and_other_control_chars() {
        assert_eq!(strip_control_chars("abc\u{0}def"), "abcdef");
        assert_eq!(strip_control_chars("\u{1}\u{8}\u{1f}x"), "x");
    }

    #[test]
    fn keeps_whitespace_controls() {
        assert_eq!(strip_control_chars("a\nb\rc\td"), "a\nb\rc\td");
    }

    #[test]
    fn normalises_to_composed_form() {
        // "e" followed by a combining acute accent composes to "é"
        assert_eq!(strip_control_chars("caf\u{65}\u{301}"), "café");
    }

    #[test]
    fn empty_string_passes_through() {
        assert_eq!(strip_control_chars(""), "");
    }

    #[test]
    fn sanitizes_nested_structures_preserving_shape() {
        let dirty = json!({
            "name": "Chill\u{0} Mix",
            "tags": ["lo\u{0}fi", "night"],
            "nested": { "description": "late\u{1f} drives" }
        });
        let clean = sanitize_value(dirty);
        assert_eq!(
            clean,
            json!({
                "name": "Chill Mix",
                "tags": ["lofi", "night"],
                "nested": { "description": "late drives" }
            })
        );
    }

    #[test]
    fn array_order_is_preserved() {
        let clean = sanitize_value(json!(["b\u{0}", "a", "c"]));
        assert_eq!(clean, json!(["b", "a", "c"]));
    }

    #[test]
    fn non_string_leaves_unchanged() {
        let value = json!({ "limit": 20, "public": true, "nothing": null });
        assert_eq!(sanitize_value(value.clone()), value);
    }
}
