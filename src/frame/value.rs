//! The dynamic value vocabulary shared by node bodies and the engine.

use super::{Series, Table};
use std::fmt;
use thiserror::Error;

/// Coarse type tag for a [`Value`].
///
/// This is the entire static type system: container element types are
/// deliberately not modeled, so two `Series` of different content are the
/// same kind. `Any` acts as the declared-supertype escape hatch on the
/// consumer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Series,
    Table,
    /// Accepts any producer kind. Only meaningful on the consuming side of
    /// a dependency; a node declaring `Any` as its return kind produces
    /// values that satisfy only `Any` consumers.
    Any,
}

impl ValueKind {
    /// Whether a dependency declared as `self` accepts a producer of
    /// `produced`. Exact match, or `Any` on the consuming side.
    pub fn accepts(&self, produced: ValueKind) -> bool {
        *self == ValueKind::Any || *self == produced
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Bool => "Bool",
            ValueKind::Int => "Int",
            ValueKind::Float => "Float",
            ValueKind::Str => "Str",
            ValueKind::Series => "Series",
            ValueKind::Table => "Table",
            ValueKind::Any => "Any",
        };
        f.write_str(s)
    }
}

/// A value flowing along a graph edge.
///
/// Cloning is cheap for the container variants: `Series` shares its buffer
/// and `Table` shares the buffers of its columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Series(Series),
    Table(Table),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Series(_) => ValueKind::Series,
            Value::Table(_) => ValueKind::Table,
        }
    }

    /// The number of rows this value contributes to an aligned result, or
    /// `None` for non-sequence values.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            Value::Series(s) => Some(s.len()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Series> for Value {
    fn from(v: Series) -> Self {
        Value::Series(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Series(Series::from_values(v))
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Value::Table(v)
    }
}

/// Failure produced inside a node body or by an [`super::Arguments`]
/// accessor. The engine wraps it with the owning node's name.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("missing argument '{name}'")]
    MissingArgument { name: String },

    #[error("argument '{name}' is {actual}, expected {expected}")]
    ArgumentKind {
        name: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("no such column '{column}' in table produced by '{table}' (has: {available})")]
    MissingColumn {
        column: String,
        table: String,
        available: String,
    },

    #[error("{0}")]
    Failed(String),
}

impl NodeError {
    /// Free-form failure for user bodies.
    pub fn failed(msg: impl Into<String>) -> Self {
        NodeError::Failed(msg.into())
    }
}
