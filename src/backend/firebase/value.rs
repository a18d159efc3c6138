//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore documents carry every value wrapped in a single-key object naming
//! its type (`{"stringValue": "neo"}`, `{"integerValue": "603"}`, ...).
//! Integers travel as strings; arrays and maps nest further typed values.

use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};

/// Encodes a JSON value as a Firestore value
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes every entry of a JSON object, as used for a document's `fields`
pub fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), encode(value)))
            .collect(),
    )
}

/// Decodes a Firestore value back into plain JSON
pub fn decode(value: &Value) -> AppResult<Value> {
    let (kind, inner) = value
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| malformed(value))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(|| malformed(value)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(Value::from).ok_or_else(|| malformed(value))
        }
        "doubleValue" => inner
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| malformed(value)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(value)),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<AppResult<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            _ => Ok(Value::Object(Map::new())),
        },
        _ => Err(malformed(value)),
    }
}

/// Decodes a document's `fields` object into a plain JSON object
pub fn decode_fields(fields: &Map<String, Value>) -> AppResult<Value> {
    let mut object = Map::new();
    for (key, value) in fields {
        object.insert(key.clone(), decode(value)?);
    }
    Ok(Value::Object(object))
}

fn malformed(value: &Value) -> AppError {
    AppError::Persistence(format!("Unsupported Firestore value: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(encode(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode(&json!(603)), json!({ "integerValue": "603" }));
        assert_eq!(encode(&json!(8.2)), json!({ "doubleValue": 8.2 }));
        assert_eq!(encode(&json!("neo")), json!({ "stringValue": "neo" }));
    }

    #[test]
    fn test_encode_movie_snapshot() {
        let movie = json!({ "id": 603, "title": "The Matrix", "poster_path": null });
        assert_eq!(
            encode(&movie),
            json!({
                "mapValue": { "fields": {
                    "id": { "integerValue": "603" },
                    "poster_path": { "nullValue": null },
                    "title": { "stringValue": "The Matrix" }
                }}
            })
        );
    }

    #[test]
    fn test_decode_document_fields() {
        let fields = json!({
            "username": { "stringValue": "neo" },
            "myList": { "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "id": { "integerValue": "603" },
                    "vote_average": { "doubleValue": 8.2 }
                }}}
            ]}}
        });

        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(
            decoded,
            json!({
                "username": "neo",
                "myList": [{ "id": 603, "vote_average": 8.2 }]
            })
        );
    }

    #[test]
    fn test_decode_empty_array_and_map() {
        assert_eq!(decode(&json!({ "arrayValue": {} })).unwrap(), json!([]));
        assert_eq!(decode(&json!({ "mapValue": {} })).unwrap(), json!({}));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = decode(&json!({ "geoPointValue": { "latitude": 1.0 } })).unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[test]
    fn test_whole_number_double_survives_as_float() {
        let encoded = encode(&json!(7.0));
        assert_eq!(encoded, json!({ "doubleValue": 7.0 }));
        assert_eq!(decode(&encoded).unwrap().as_f64(), Some(7.0));
    }
}
