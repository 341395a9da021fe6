//! Optimistic-concurrency tokens for VOS records

use serde_json::Value;
use std::collections::BTreeMap;

/// Hash a raw record as returned by VOS3000.
///
/// Object keys are sorted before hashing, so two fetches of an unchanged
/// record produce the same token regardless of field order on the wire.
pub fn object_hash(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(canonical.as_bytes()))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, v)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"name":"MG1","lockType":0}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"lockType":0,"name":"MG1"}"#).unwrap();
        assert_eq!(object_hash(&a), object_hash(&b));
        assert_eq!(object_hash(&a).len(), 16);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let before = json!({"name": "MG1", "calloutCallerPrefixes": "111,222"});
        let after = json!({"name": "MG1", "calloutCallerPrefixes": "111"});
        assert_ne!(object_hash(&before), object_hash(&after));
    }

    #[test]
    fn test_nested_objects_are_canonical() {
        let a = json!({"outer": {"b": 1, "a": [{"y": 2, "x": 1}]}});
        let b: Value =
            serde_json::from_str(r#"{"outer":{"a":[{"x":1,"y":2}],"b":1}}"#).unwrap();
        assert_eq!(object_hash(&a), object_hash(&b));
    }
}
