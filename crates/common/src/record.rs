//! Caller records and their canonical byte form.

use serde_json::{Map, Value};

use crate::error::{Result, SealError};

/// A caller-supplied mapping of field names to JSON values
pub type Record = Map<String, Value>;

/// Serialize a record with every object's keys sorted, recursively
///
/// Two records holding the same key/value pairs produce identical bytes no
/// matter the insertion order, which keeps digests reproducible.
pub fn canonical_bytes(record: &Record) -> Result<Vec<u8>> {
    let canonical = canonicalize_object(record);
    serde_json::to_vec(&canonical).map_err(|e| SealError::MalformedRecord(e.to_string()))
}

/// Parse bytes produced by [`canonical_bytes`] back into a record
///
/// # Errors
///
/// Returns [`SealError::MalformedRecord`] if the bytes are not JSON or the
/// top-level value is not an object.
pub fn parse_record(bytes: &[u8]) -> Result<Record> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| SealError::MalformedRecord(format!("invalid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SealError::MalformedRecord(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn canonicalize_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    // Inserting in sorted order keeps the result sorted even when serde_json
    // is built with `preserve_order`.
    let mut out = Map::with_capacity(map.len());
    for key in keys {
        out.insert(key.clone(), canonicalize(&map[key]));
    }
    out
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonicalize_object(map)),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = Record::new();
        a.insert("email".into(), json!("a@example.com"));
        a.insert("name".into(), json!("Ada"));
        a.insert("nested".into(), json!({"z": 1, "a": [{"y": 2, "b": 3}]}));

        let mut b = Record::new();
        b.insert("nested".into(), json!({"a": [{"b": 3, "y": 2}], "z": 1}));
        b.insert("name".into(), json!("Ada"));
        b.insert("email".into(), json!("a@example.com"));

        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }

    #[test]
    fn test_canonical_form_is_compact_and_sorted() {
        let r = record(json!({"b": 1, "a": {"d": true, "c": null}}));
        let bytes = canonical_bytes(&r).unwrap();
        assert_eq!(bytes, br#"{"a":{"c":null,"d":true},"b":1}"#.to_vec());
    }

    #[test]
    fn test_array_order_is_preserved() {
        let r = record(json!({"list": [3, 1, 2]}));
        let parsed = parse_record(&canonical_bytes(&r).unwrap()).unwrap();
        assert_eq!(parsed["list"], json!([3, 1, 2]));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            parse_record(b"[1, 2]"),
            Err(SealError::MalformedRecord(_))
        ));
        assert!(matches!(
            parse_record(b"\xff\xfe"),
            Err(SealError::MalformedRecord(_))
        ));
    }
}
