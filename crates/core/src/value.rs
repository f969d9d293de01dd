//! Runtime value model shared by the parser (literal arguments) and the
//! evaluator (form data, helper arguments and results).
//!
//! Numbers use `rust_decimal::Decimal` -- never `f64` -- so that equality is
//! exact numeric equality and rendering never shows binary float noise.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A dynamically typed value. Lists and maps are never mutated once a
/// render pass has started.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Decimal),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns a human-readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Conditional truthiness. `Null`, `false`, `0`, `""` and `[]` are
    /// falsy; everything else (including an empty map) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// One step of path resolution.
    ///
    /// A List is indexed only by a segment made of ASCII digits; a Map is
    /// keyed by the segment verbatim. Anything else is unresolved.
    pub fn get(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::List(items) => {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            Value::Map(fields) => fields.get(segment),
            _ => None,
        }
    }

    /// Text form used when a value is substituted into a document.
    pub fn render(&self) -> String {
        match self {
            Value::Null | Value::Map(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.normalize().to_string(),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Build a Map value from `(key, value)` pairs.
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert from JSON. Numbers outside the `Decimal` range become `Null`.
    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match number_to_decimal(n) {
                Some(d) => Value::Number(d),
                None => {
                    tracing::warn!(number = %n, "number not representable as decimal, using null");
                    Value::Null
                }
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Whole numbers become JSON integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract().is_zero() {
                    if let Some(i) = n.to_i64() {
                        return serde_json::Value::from(i);
                    }
                }
                n.to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ──────────────────────────────────────────────
// Conversions
// ──────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(&v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|v| Value::from_json(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for v in [
            Value::Null,
            Value::Bool(false),
            Value::from(0),
            Value::from(""),
            Value::List(vec![]),
        ] {
            assert!(!v.is_truthy(), "{:?} should be falsy", v);
        }
    }

    #[test]
    fn truthy_values() {
        for v in [
            Value::Bool(true),
            Value::from(-1),
            Value::from("0"),
            Value::from(" "),
            Value::List(vec![Value::Null]),
            Value::Map(BTreeMap::new()),
        ] {
            assert!(v.is_truthy(), "{:?} should be truthy", v);
        }
    }

    #[test]
    fn get_indexes_lists_only_with_digit_segments() {
        let list = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(list.get("1"), Some(&Value::from("b")));
        assert_eq!(list.get("2"), None);
        assert_eq!(list.get("+1"), None);
        assert_eq!(list.get("name"), None);
    }

    #[test]
    fn get_keys_maps_verbatim() {
        let map = Value::map([("0", Value::from("zero")), ("name", Value::from("Bob"))]);
        assert_eq!(map.get("0"), Some(&Value::from("zero")));
        assert_eq!(map.get("name"), Some(&Value::from("Bob")));
        assert_eq!(Value::from("text").get("0"), None);
    }

    #[test]
    fn numbers_compare_by_value_and_render_normalised() {
        let a = Value::from_json(&json!(1.50));
        let b = Value::from_json(&json!("1.5"));
        assert_eq!(a.render(), "1.5");
        assert_ne!(a, b);
        assert_eq!(Value::from_json(&json!(2.0)), Value::from(2));
        assert_eq!(Value::from(5).render(), "5");
    }

    #[test]
    fn lists_render_comma_joined_and_maps_render_empty() {
        let v = Value::from_json(&json!(["a", 1, true, null]));
        assert_eq!(v.render(), "a,1,true,");
        assert_eq!(Value::from_json(&json!({"a": 1})).render(), "");
    }

    #[test]
    fn json_conversion_preserves_shape() {
        let src = json!({"officers": [{"name": "Bob", "badge": 42}], "flag": false, "n": null});
        let v: Value = serde_json::from_value(src.clone()).unwrap();
        assert_eq!(serde_json::to_value(&v).unwrap(), src);
    }
}
