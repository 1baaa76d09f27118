//! Graph-construction-time configuration.
//!
//! A [`Config`] is fixed for the lifetime of the graph built from it. It
//! serves three roles: literal leaf values for dependency resolution,
//! inputs to [`Predicate`] evaluation, and feature specifications for
//! model-backed nodes.

pub mod predicate;

pub use predicate::Predicate;

use crate::frame::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw configuration values are JSON values; only a subset maps onto the
/// engine's value vocabulary (see [`Config::leaf`]).
pub type ConfigValue = serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    entries: BTreeMap<String, ConfigValue>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object into a config. Any other JSON shape is a
    /// deserialization error.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry under `key` as an engine value, if its JSON shape maps
    /// onto one: booleans, numbers, strings, and all-numeric arrays.
    /// Objects, nulls, and mixed arrays are predicate/model material only.
    pub fn leaf(&self, key: &str) -> Option<Value> {
        json_to_value(self.entries.get(key)?)
    }

    /// The kind [`Config::leaf`] would report for `key`, without building
    /// the value. Used by the builder's static type check.
    pub fn leaf_kind(&self, key: &str) -> Option<ValueKind> {
        match self.entries.get(key)? {
            ConfigValue::Bool(_) => Some(ValueKind::Bool),
            ConfigValue::Number(n) => Some(if n.is_i64() {
                ValueKind::Int
            } else {
                ValueKind::Float
            }),
            ConfigValue::String(_) => Some(ValueKind::Str),
            ConfigValue::Array(items) => items
                .iter()
                .all(|i| i.is_number())
                .then_some(ValueKind::Series),
            _ => None,
        }
    }

    /// All entries expressible as engine values, for seeding a call's memo.
    pub(crate) fn leaves(&self) -> impl Iterator<Item = (&str, Value)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| Some((k.as_str(), json_to_value(v)?)))
    }
}

fn json_to_value(raw: &ConfigValue) -> Option<Value> {
    match raw {
        ConfigValue::Bool(b) => Some(Value::Bool(*b)),
        ConfigValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        ConfigValue::String(s) => Some(Value::Str(s.clone())),
        ConfigValue::Array(items) => {
            let floats: Option<Vec<f64>> = items.iter().map(|i| i.as_f64()).collect();
            floats.map(Value::from)
        }
        _ => None,
    }
}
