//! The data a template is rendered against.
//!
//! A [`DataContext`] is a map of form field names to values plus two
//! reserved namespaces: `officers` (one map per repeated officer block) and
//! `general` (a single map of incident details). Contexts are built fresh
//! for every render and never retained by the engine.

use std::collections::BTreeMap;

use mdc_core::generator::{GENERAL_KEY, OFFICERS_KEY};
use mdc_core::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct DataContext {
    /// Always a `Value::Map`.
    root: Value,
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContext {
    pub fn new() -> Self {
        DataContext {
            root: Value::Map(BTreeMap::new()),
        }
    }

    /// Set a top-level field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Value::Map(fields) = &mut self.root {
            fields.insert(name.into(), value.into());
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_officers(mut self, officers: Vec<Officer>) -> Self {
        let list = officers.into_iter().map(Officer::into_value).collect();
        self.insert(OFFICERS_KEY, Value::List(list));
        self
    }

    pub fn with_general(mut self, general: General) -> Self {
        self.insert(GENERAL_KEY, general.into_value());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// The root map, as handed to the renderer.
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl From<BTreeMap<String, Value>> for DataContext {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        DataContext {
            root: Value::Map(fields),
        }
    }
}

/// One repeated officer block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Officer {
    pub name: String,
    pub badge_number: String,
    pub department: String,
    pub callsign: String,
    /// Any further per-officer fields the generator collects.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Officer {
    pub fn into_value(self) -> Value {
        let mut fields = self.extra;
        fields.insert("name".to_owned(), Value::String(self.name));
        fields.insert("badgeNumber".to_owned(), Value::String(self.badge_number));
        fields.insert("department".to_owned(), Value::String(self.department));
        fields.insert("callsign".to_owned(), Value::String(self.callsign));
        Value::Map(fields)
    }
}

/// The singleton incident-details block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub date: String,
    pub time: String,
    pub district: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl General {
    pub fn into_value(self) -> Value {
        let mut fields = self.extra;
        fields.insert("date".to_owned(), Value::String(self.date));
        fields.insert("time".to_owned(), Value::String(self.time));
        fields.insert("district".to_owned(), Value::String(self.district));
        Value::Map(fields)
    }
}
