//! Artifact fingerprints
//!
//! Artifacts are fingerprinted over their canonical JSON form (object keys
//! sorted recursively, no whitespace) so that the same logical artifact
//! always yields the same blake3 digest regardless of how the file was
//! formatted on disk.

use crate::errors::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialize a value to canonical JSON
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sort_keys(value))?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Hex-encoded blake3 digest of the canonical JSON form
pub fn fingerprint_hex<T: Serialize>(value: &T) -> Result<String> {
    let json = canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_fingerprint() {
        let a = json!({"b": 1, "a": {"y": [1, 2], "x": "v"}});
        let b = json!({"a": {"x": "v", "y": [1, 2]}, "b": 1});
        assert_eq!(fingerprint_hex(&a).unwrap(), fingerprint_hex(&b).unwrap());
    }

    #[test]
    fn canonical_json_is_compact_and_sorted() {
        let value = json!({"zeta": 1, "alpha": 2});
        let json = canonical_json(&value).unwrap();
        assert_eq!(json, r#"{"alpha":2,"zeta":1}"#);
    }

    #[test]
    fn array_order_is_significant() {
        let a = json!(["Month", "Quarter"]);
        let b = json!(["Quarter", "Month"]);
        assert_ne!(fingerprint_hex(&a).unwrap(), fingerprint_hex(&b).unwrap());
        assert_eq!(fingerprint_hex(&a).unwrap().len(), 64);
    }
}
