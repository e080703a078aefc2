//! Reshaping functions for irregular JSON
//!
//! These are exposed to query expressions through [`new_function_table`], but the
//! functions themselves are plain transformations over `serde_json::Value`
//! and can be called directly.
//!
//! - `from_string`: un-nest one level of double-encoded JSON
//! - `pairs` / `items`: object to `[key, value]` pairs
//! - `to_hash`: `[key, value]` pairs back to an object, last value wins
//! - `unroll`: name/value objects to an object, promoting repeated keys to arrays

pub mod registry;

pub use registry::{new_function_table, register_functions};

use crate::error::FunctionError;
use crate::project::flatten::scalar_text;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Parse nested JSON text.
///
/// Strings that fail to parse are handed back unchanged. Arrays are parsed
/// element by element and any failing element fails the whole call.
pub fn from_string(arg: &Value) -> Result<Value, FunctionError> {
    match arg {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let Value::String(text) = item else {
                    return Err(FunctionError::ElementNotString { index });
                };
                serde_json::from_str(text).map_err(|e| FunctionError::ElementParse {
                    index,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::String(text) => Ok(serde_json::from_str(text).unwrap_or_else(|_| arg.clone())),
        other => Ok(other.clone()),
    }
}

/// Create a `[key, value]` array for each entry of an object, in iteration order
pub fn pairs(object: &Map<String, Value>) -> Vec<Value> {
    object
        .iter()
        .map(|(key, value)| Value::Array(vec![Value::String(key.clone()), value.clone()]))
        .collect()
}

/// A `[key, value]` array element
#[derive(Debug, Clone, Copy)]
struct Pair<'a> {
    key: &'a Value,
    value: &'a Value,
}

impl<'a> Pair<'a> {
    fn from_value(item: &'a Value) -> Option<Self> {
        match item.as_array()?.as_slice() {
            [key, value] => Some(Pair { key, value }),
            _ => None,
        }
    }
}

/// Build an object from `[key, value]` pairs.
///
/// Elements that are not two-element arrays are skipped, as are pairs whose key
/// is an array or object. Duplicate keys keep the last value.
pub fn to_hash(array: &[Value]) -> Map<String, Value> {
    let mut object = Map::new();

    for pair in array.iter().filter_map(Pair::from_value) {
        let key = match pair.key {
            Value::Array(_) | Value::Object(_) => continue,
            scalar => scalar_text(scalar),
        };
        object.insert(key, pair.value.clone());
    }

    object
}

/// Values collected for one key by [`unroll`]
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Single(Value),
    Multiple(Vec<Value>),
}

impl Slot {
    fn push(&mut self, value: Value) {
        match self {
            Slot::Multiple(values) => values.push(value),
            Slot::Single(first) => {
                let first = std::mem::take(first);
                *self = Slot::Multiple(vec![first, value]);
            }
        }
    }

    /// A slot that started out holding an array keeps appending to it
    fn seed(value: Value) -> Self {
        match value {
            Value::Array(values) => Slot::Multiple(values),
            other => Slot::Single(other),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Slot::Single(value) => value,
            Slot::Multiple(values) => Value::Array(values),
        }
    }
}

/// Build an object from an array of name/value objects.
///
/// `unroll([{"Name": "n", "Value": "v"}], "Name", "Value")` gives `{"n": "v"}`.
/// Elements missing either field are skipped. A key seen more than once turns
/// into an array of its values in encounter order.
pub fn unroll(array: &[Value], key_field: &str, value_field: &str) -> Map<String, Value> {
    let mut slots: IndexMap<String, Slot> = IndexMap::new();

    for item in array {
        let Some(entry) = item.as_object() else {
            continue;
        };
        let (Some(key), Some(value)) = (entry.get(key_field), entry.get(value_field)) else {
            continue;
        };

        let key = scalar_text(key);
        match slots.get_mut(&key) {
            Some(slot) => slot.push(value.clone()),
            None => {
                slots.insert(key, Slot::seed(value.clone()));
            }
        }
    }

    slots
        .into_iter()
        .map(|(key, slot)| (key, slot.into_value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn array(value: Value) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            other => panic!("expected array, got {}", other),
        }
    }

    #[test]
    fn test_from_string_nested_text() {
        assert_eq!(from_string(&json!("{\"a\": [1, 2]}")).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(from_string(&json!("not json")).unwrap(), json!("not json"));
        assert_eq!(from_string(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_from_string_array() {
        assert_eq!(
            from_string(&json!(["1", "\"x\"", "{\"k\": true}"])).unwrap(),
            json!([1, "x", {"k": true}])
        );

        assert!(matches!(
            from_string(&json!(["1", "nope"])),
            Err(FunctionError::ElementParse { index: 1, .. })
        ));
        assert_eq!(
            from_string(&json!(["1", 2])),
            Err(FunctionError::ElementNotString { index: 1 })
        );
    }

    #[test]
    fn test_pairs_preserves_order() {
        let object = json!({"b": 1, "a": 2, "c": [3]});
        let out = pairs(object.as_object().unwrap());

        assert_eq!(Value::Array(out), json!([["b", 1], ["a", 2], ["c", [3]]]));
    }

    #[test]
    fn test_to_hash_last_value_wins() {
        let out = to_hash(&array(json!([["a", 1], ["b", 2], ["a", 3]])));

        assert_eq!(Value::Object(out), json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_to_hash_skips_malformed_pairs() {
        let out = to_hash(&array(json!([
            ["a", 1],
            ["too", "many", "items"],
            ["short"],
            "ab",
            {"k": "v"},
            [["list"], "key"],
            [7, "seven"],
            [true, "yes"]
        ])));

        assert_eq!(Value::Object(out), json!({"a": 1, "7": "seven", "true": "yes"}));
    }

    #[test]
    fn test_unroll_promotes_duplicates() {
        let out = unroll(
            &array(json!([
                {"Name": "x", "Value": 1},
                {"Name": "x", "Value": 2},
                {"Name": "y", "Value": 3}
            ])),
            "Name",
            "Value",
        );

        assert_eq!(Value::Object(out), json!({"x": [1, 2], "y": 3}));
    }

    #[test]
    fn test_unroll_skips_missing_fields() {
        let with_gaps = array(json!([
            {"Name": "a", "Value": 1},
            {"Value": 2},
            {"Name": "b"},
            "not an object",
            {"Name": "c", "Value": 3}
        ]));
        let without = array(json!([
            {"Name": "a", "Value": 1},
            {"Name": "c", "Value": 3}
        ]));

        assert_eq!(unroll(&with_gaps, "Name", "Value"), unroll(&without, "Name", "Value"));
    }

    #[test]
    fn test_unroll_stringifies_keys() {
        let out = unroll(
            &array(json!([
                {"k": 1, "v": "one"},
                {"k": false, "v": "no"},
                {"k": "1", "v": "uno"}
            ])),
            "k",
            "v",
        );

        assert_eq!(Value::Object(out), json!({"1": ["one", "uno"], "false": "no"}));
    }

    #[test]
    fn test_unroll_appends_to_array_values() {
        let out = unroll(
            &array(json!([
                {"k": "tags", "v": ["a", "b"]},
                {"k": "tags", "v": "c"},
                {"k": "one", "v": "x"},
                {"k": "one", "v": ["y"]}
            ])),
            "k",
            "v",
        );

        assert_eq!(
            Value::Object(out),
            json!({"tags": ["a", "b", "c"], "one": ["x", ["y"]]})
        );
    }
}
