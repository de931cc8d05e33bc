//! # Canonical Encoding
//!
//! Deterministic serialization of dict-shaped content: every mapping is
//! rebuilt with its keys in lexicographic order, recursively, so two values
//! that differ only in insertion order encode to identical bytes.
//!
//! Only string keys are allowed. A map keyed by anything that does not
//! serialize to a string is a format error.

use crate::CryptoError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Convert `value` to a JSON tree with every object's keys sorted.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Value, CryptoError> {
    let raw =
        serde_json::to_value(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))?;
    Ok(deep_sort(raw))
}

/// Canonical byte encoding (compact JSON of the sorted tree).
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    let sorted = canonicalize(value)?;
    serde_json::to_vec(&sorted).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}

/// `serde_json::Map` is already key-ordered unless some crate in the build
/// turns on serde_json's `preserve_order` feature, which swaps it for an
/// insertion-ordered map. Features unify across a dependency graph, so the
/// sort stays to keep hashes stable in either build.
fn deep_sort(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, deep_sort(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(deep_sort).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_nested_objects_sorted() {
        let value = serde_json::json!({"b": {"z": 1, "a": 2}, "a": [{"d": 0, "c": 1}]});
        let bytes = canonical_bytes(&value).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":[{"c":1,"d":0}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn test_insertion_ordered_map_sorted() {
        // Reverse insertion order; an insertion-ordered map would keep it.
        let mut inner = Map::new();
        inner.insert("z".into(), Value::from(1));
        inner.insert("a".into(), Value::from(2));
        let mut outer = Map::new();
        outer.insert("y".into(), Value::Object(inner));
        outer.insert("b".into(), Value::Array(vec![]));

        let sorted = deep_sort(Value::Object(outer));
        let keys: Vec<&String> = sorted.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "y"]);
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            r#"{"b":[],"y":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn test_array_order_preserved() {
        let value = serde_json::json!([3, 1, 2]);
        assert_eq!(canonical_bytes(&value).unwrap(), b"[3,1,2]".to_vec());
    }

    #[test]
    fn test_non_string_keys_rejected() {
        let mut map: HashMap<(u8, u8), u8> = HashMap::new();
        map.insert((1, 2), 3);
        assert!(matches!(
            canonicalize(&map),
            Err(CryptoError::Canonicalization(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_insertion_order_irrelevant(
            entries in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12)
        ) {
            let forward: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();
            let reverse: Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();

            let wrapped_fwd = serde_json::json!({"inner": Value::Object(forward)});
            let wrapped_rev = serde_json::json!({"inner": Value::Object(reverse)});

            prop_assert_eq!(
                canonical_bytes(&wrapped_fwd).unwrap(),
                canonical_bytes(&wrapped_rev).unwrap()
            );
        }
    }
}
