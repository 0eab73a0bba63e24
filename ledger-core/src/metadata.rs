//! Metadata documents and their stored encoding.
//!
//! Metadata is an arbitrary key/value document. It is stored as a JSON
//! object (JSONB in Postgres). Anything else found in the metadata column is
//! treated as corruption.

use serde_json::{Map, Value as JsonValue};

use crate::{LedgerError, LedgerResult};

/// Caller-supplied key/value document attached to a ledger.
pub type Metadata = Map<String, JsonValue>;

/// Encode metadata into the document stored alongside a ledger row.
///
/// JSONB cannot hold the NUL character, so a key or string containing one
/// at any depth is rejected here rather than by the database.
pub fn encode_metadata(metadata: &Metadata) -> LedgerResult<JsonValue> {
    for (key, value) in metadata {
        check_representable(key, value)?;
    }
    Ok(serde_json::to_value(metadata)?)
}

fn check_representable(path: &str, value: &JsonValue) -> LedgerResult<()> {
    if path.contains('\0') {
        return Err(nul_error(path));
    }
    match value {
        JsonValue::String(s) if s.contains('\0') => Err(nul_error(path)),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_representable(&format!("{path}[{i}]"), item)),
        JsonValue::Object(map) => map
            .iter()
            .try_for_each(|(key, item)| check_representable(&format!("{path}.{key}"), item)),
        _ => Ok(()),
    }
}

fn nul_error(path: &str) -> LedgerError {
    LedgerError::serialization(format!(
        "metadata at {} contains a NUL character",
        path.escape_debug()
    ))
}

/// Decode a stored metadata document.
pub fn decode_metadata(document: JsonValue) -> LedgerResult<Metadata> {
    match document {
        JsonValue::Object(map) => Ok(map),
        other => Err(LedgerError::serialization(format!(
            "metadata document must be an object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Decode a metadata document from its raw JSON text.
pub fn decode_metadata_slice(bytes: &[u8]) -> LedgerResult<Metadata> {
    let document: JsonValue = serde_json::from_slice(bytes)?;
    decode_metadata(document)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: JsonValue) -> Metadata {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_metadata_round_trips() {
        let metadata = Metadata::new();
        let doc = encode_metadata(&metadata).unwrap();
        assert_eq!(doc, json!({}));
        assert_eq!(decode_metadata(doc).unwrap(), metadata);
    }

    #[test]
    fn test_nested_metadata_round_trips_through_text() {
        let metadata = as_map(json!({
            "region": "eu",
            "limits": { "daily": 5000, "ratio": 0.25 },
            "tags": ["ops", "treasury"],
            "active": true,
            "parent": null
        }));
        let doc = encode_metadata(&metadata).unwrap();
        let text = serde_json::to_vec(&doc).unwrap();
        assert_eq!(decode_metadata_slice(&text).unwrap(), metadata);
    }

    #[test]
    fn test_non_object_document_is_corruption() {
        for doc in [json!(null), json!([1, 2]), json!("eu"), json!(42)] {
            let err = decode_metadata(doc).unwrap_err();
            assert!(matches!(err, LedgerError::Serialization { .. }));
        }
    }

    #[test]
    fn test_nul_characters_are_rejected_at_any_depth() {
        let documents = [
            json!({ "k": "a\u{0000}b" }),
            json!({ "k\u{0000}": "ok" }),
            json!({ "outer": { "inner": ["fine", "bad\u{0000}"] } }),
            json!({ "outer": [{ "nested\u{0000}key": 1 }] }),
        ];
        for doc in documents {
            let err = encode_metadata(&as_map(doc)).unwrap_err();
            assert!(matches!(err, LedgerError::Serialization { .. }));
        }
    }

    #[test]
    fn test_other_control_characters_are_accepted() {
        let metadata = as_map(json!({ "note": "tab\tand\nnewline", "bell": "\u{0007}" }));
        let doc = encode_metadata(&metadata).unwrap();
        assert_eq!(decode_metadata(doc).unwrap(), metadata);
    }

    #[test]
    fn test_unparseable_text_is_corruption() {
        let err = decode_metadata_slice(b"{\"region\": ").unwrap_err();
        assert!(matches!(err, LedgerError::Serialization { .. }));
    }
}
