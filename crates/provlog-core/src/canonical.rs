//! Canonical JSON encoding for deterministic serialization.
//!
//! This module encodes a `serde_json::Value` so that the same logical value
//! always yields the same bytes:
//! - Object keys sorted by ascending code point, at every nesting level
//! - No insignificant whitespace (`,` and `:` separators only)
//! - UTF-8 text; only `"`, `\` and control characters are escaped
//! - Integers in plain decimal, floats in shortest round-trip form
//!
//! The signature on every chain entry covers these bytes, so the encoding is
//! frozen. Changing it invalidates every existing signature and entry hash.
//!
//! This is not byte-compatible with Python's `json.dumps(sort_keys=True)`
//! defaults. Non-ASCII text stays raw UTF-8 rather than `\uXXXX` escapes, and
//! floats print as serde_json does (`1e16`, not `1e+16`). The signed field
//! names differ from those writers too, so their chains are not expected to
//! verify here.

use std::fmt::Write;

use serde_json::Value;

/// Encode a value to canonical JSON bytes.
pub fn canonicalize(value: &Value) -> Vec<u8> {
    canonical_string(value).into_bytes()
}

/// Encode a value to canonical JSON text.
pub fn canonical_string(value: &Value) -> String {
    let mut buf = String::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a JSON value.
fn encode_value_to(buf: &mut String, value: &Value) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            // serde_json prints integers in decimal and floats via ryu
            let _ = write!(buf, "{}", n);
        }
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_value_to(buf, item);
            }
            buf.push(']');
        }
        Value::Object(map) => encode_object(buf, map),
    }
}

/// Encode an object with keys sorted by code point.
///
/// `String`'s `Ord` compares UTF-8 bytes, which orders identically to code
/// points. The map's own iteration order is never trusted.
fn encode_object(buf: &mut String, map: &serde_json::Map<String, Value>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    buf.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        encode_string(buf, key);
        buf.push(':');
        encode_value_to(buf, value);
    }
    buf.push('}');
}

/// Encode a JSON string literal.
fn encode_string(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{08}' => buf.push_str("\\b"),
            '\u{0c}' => buf.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = json!({
            "b": 1,
            "a": { "z": true, "c": null },
            "aa": [ { "y": 2, "x": 1 } ]
        });
        assert_eq!(
            canonical_string(&value),
            r#"{"a":{"c":null,"z":true},"aa":[{"x":1,"y":2}],"b":1}"#
        );
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut m1 = serde_json::Map::new();
        m1.insert("zeta".into(), json!(1));
        m1.insert("alpha".into(), json!(2));

        let mut m2 = serde_json::Map::new();
        m2.insert("alpha".into(), json!(2));
        m2.insert("zeta".into(), json!(1));

        assert_eq!(
            canonicalize(&Value::Object(m1)),
            canonicalize(&Value::Object(m2))
        );
    }

    #[test]
    fn test_code_point_ordering() {
        // 'Z' (0x5a) < '_' (0x5f) < 'a' (0x61) < 'é' (0xe9)
        let value = json!({ "é": 4, "a": 3, "_": 2, "Z": 1 });
        assert_eq!(canonical_string(&value), r#"{"Z":1,"_":2,"a":3,"é":4}"#);
    }

    #[test]
    fn test_string_escaping() {
        let value = json!("quote\" back\\ nl\n tab\t bell\u{07} snow☃");
        assert_eq!(
            canonical_string(&value),
            "\"quote\\\" back\\\\ nl\\n tab\\t bell\\u0007 snow☃\""
        );
    }

    #[test]
    fn test_numbers() {
        let value = json!([0, -7, 18446744073709551615u64, 1.5, -0.25]);
        assert_eq!(
            canonical_string(&value),
            "[0,-7,18446744073709551615,1.5,-0.25]"
        );
    }

    #[test]
    fn test_no_whitespace() {
        let value = json!({ "list": [1, 2, 3], "empty": {}, "none": [] });
        let text = canonical_string(&value);
        assert!(!text.contains(' '));
        assert_eq!(text, r#"{"empty":{},"list":[1,2,3],"none":[]}"#);
    }

    #[test]
    fn test_reparse_is_stable() {
        let value = json!({ "s": "ünïcödé", "n": [1, { "k": false }], "x": null });
        let first = canonicalize(&value);
        let reparsed: Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(canonicalize(&reparsed), first);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_order_independent(pairs in prop::collection::vec(("[a-zA-Z_é]{1,8}", any::<i64>()), 0..12)) {
                let mut forward = serde_json::Map::new();
                for (k, v) in &pairs {
                    forward.insert(k.clone(), json!(v));
                }
                let mut backward = serde_json::Map::new();
                for (k, _) in pairs.iter().rev() {
                    backward.insert(k.clone(), forward[k].clone());
                }
                prop_assert_eq!(
                    canonicalize(&Value::Object(forward)),
                    canonicalize(&Value::Object(backward))
                );
            }

            #[test]
            fn prop_strings_reparse(s in "\\PC*") {
                let encoded = canonicalize(&json!(s));
                let decoded: Value = serde_json::from_slice(&encoded).unwrap();
                prop_assert_eq!(decoded, json!(s));
            }
        }
    }
}
