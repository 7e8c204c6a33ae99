//! Conversion between plain JSON and Firestore's typed `Value` wire form.

use crate::utils::error::{Result, SeedError};
use serde_json::{json, Map, Value};

/// Encodes a record's top-level fields as a Firestore `fields` map.
pub fn encode_fields(content: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut fields = Map::with_capacity(content.len());
    for (name, value) in content {
        fields.insert(name.clone(), encode_value(name, value)?);
    }
    Ok(fields)
}

fn encode_value(path: &str, value: &Value) -> Result<Value> {
    let encoded = match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if n.is_f64() {
                match n.as_f64() {
                    Some(f) => json!({ "doubleValue": f }),
                    None => {
                        return Err(SeedError::EncodingError {
                            field: path.to_string(),
                            message: format!("number {} is not representable", n),
                        })
                    }
                }
            } else {
                return Err(SeedError::EncodingError {
                    field: path.to_string(),
                    message: format!("integer {} does not fit in a signed 64-bit value", n),
                });
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_value(&format!("{}[{}]", path, i), item))
                .collect::<Result<Vec<_>>>()?;
            if values.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => {
            let mut fields = Map::with_capacity(map.len());
            for (name, nested) in map {
                fields.insert(
                    name.clone(),
                    encode_value(&format!("{}.{}", path, name), nested)?,
                );
            }
            json!({ "mapValue": { "fields": fields } })
        }
    };
    Ok(encoded)
}

/// Decodes a Firestore `fields` map back into plain JSON.
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.clone(),
        // integerValue arrives as a decimal string
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            other => other.clone(),
        },
        "doubleValue" => match inner {
            Value::String(s) => match s.as_str() {
                "NaN" | "Infinity" | "-Infinity" => Value::String(s.clone()),
                _ => s
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(s.clone())),
            },
            other => other.clone(),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(Value::from(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(Value::from(0.0)),
        }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}
