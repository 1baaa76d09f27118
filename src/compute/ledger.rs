//! The per-call memo and the execution error set.

use crate::frame::{NodeError, Value};
use std::collections::HashMap;

pub use self::error::ExecutionError;
mod error {
    use super::*;
    use thiserror::Error;

    /// Any of these aborts the whole `execute` call; no partial result
    /// set is ever returned.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum ExecutionError {
        #[error("unresolved dependency '{name}' (required by {requested_by})")]
        UnresolvedDependency { name: String, requested_by: String },

        #[error("node '{node}' failed: {source}")]
        NodeFailed {
            node: String,
            #[source]
            source: NodeError,
        },

        #[error("validation failed on node '{node}' by '{validator}': {message}")]
        ValidationFailure {
            node: String,
            validator: String,
            message: String,
        },

        #[error("misaligned series outputs: {details}")]
        Alignment { details: String },

        #[error(
            "recursion limit {limit} exceeded while resolving '{name}' \
             (cyclic or excessively deep dependency chain)"
        )]
        RecursionLimit { limit: usize, name: String },
    }
}

/// Name-keyed memo, scoped to one `execute` call and discarded with it.
/// Never shared across concurrent calls.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    values: HashMap<String, Value>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
