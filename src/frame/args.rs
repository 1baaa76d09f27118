//! The keyword-style bundle of resolved dependency values handed to a
//! node body. Accessors are typed; misuse surfaces as a [`NodeError`]
//! rather than a panic so the engine can name the failing node.

use super::value::{NodeError, Value, ValueKind};
use super::{Series, Table};

#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used by decorator wrappers to bind literals.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), value.into());
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Result<&Value, NodeError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| NodeError::MissingArgument {
                name: name.to_string(),
            })
    }

    pub fn series(&self, name: &str) -> Result<&Series, NodeError> {
        match self.get(name)? {
            Value::Series(s) => Ok(s),
            other => Err(self.kind_error(name, ValueKind::Series, other)),
        }
    }

    pub fn table(&self, name: &str) -> Result<&Table, NodeError> {
        match self.get(name)? {
            Value::Table(t) => Ok(t),
            other => Err(self.kind_error(name, ValueKind::Table, other)),
        }
    }

    /// Float accessor; integer values widen.
    pub fn float(&self, name: &str) -> Result<f64, NodeError> {
        match self.get(name)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(self.kind_error(name, ValueKind::Float, other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, NodeError> {
        match self.get(name)? {
            Value::Int(v) => Ok(*v),
            other => Err(self.kind_error(name, ValueKind::Int, other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, NodeError> {
        match self.get(name)? {
            Value::Bool(v) => Ok(*v),
            other => Err(self.kind_error(name, ValueKind::Bool, other)),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str, NodeError> {
        match self.get(name)? {
            Value::Str(v) => Ok(v),
            other => Err(self.kind_error(name, ValueKind::Str, other)),
        }
    }

    fn kind_error(&self, name: &str, expected: ValueKind, actual: &Value) -> NodeError {
        NodeError::ArgumentKind {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}
