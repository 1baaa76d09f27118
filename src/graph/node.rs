//! The node type: one uniquely named unit of computation.

use crate::declare::NodeFn;
use crate::frame::ValueKind;
use crate::validation::OutputCheck;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Which decorator produced a node. Recorded for name-derivation rules
/// and diagnostics; the engine itself never branches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOrigin {
    /// A plainly declared function.
    Declared,
    /// Body supplied by a `does` delegate.
    Delegated,
    /// A `parameterized` variant of `base`.
    Parameterized { base: String },
    /// A `parameterized_inputs` variant of `base`.
    BoundInputs { base: String },
    /// A column selected out of the table produced by `table`.
    ExtractedColumn { table: String },
    /// Computed by a config-instantiated model.
    Model,
}

/// Dependency lists are almost always short; keep them inline.
pub(crate) type DependencyList = SmallVec<[(String, ValueKind); 4]>;

/// A single node in the graph. Immutable once the graph is built.
#[derive(Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) dependencies: DependencyList,
    pub(crate) returns: ValueKind,
    pub(crate) body: NodeFn,
    pub(crate) tags: BTreeMap<String, String>,
    pub(crate) checks: Vec<OutputCheck>,
    pub(crate) origin: NodeOrigin,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Declared dependencies, in resolution order.
    pub fn dependencies(&self) -> &[(String, ValueKind)] {
        &self.dependencies
    }

    pub fn returns(&self) -> ValueKind {
        self.returns
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn origin(&self) -> &NodeOrigin {
        &self.origin
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("returns", &self.returns)
            .field("tags", &self.tags)
            .field("checks", &self.checks.len())
            .field("origin", &self.origin)
            .finish()
    }
}

/// Introspection record for one surviving node, as returned by
/// `available_variables`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub kind: ValueKind,
    pub tags: BTreeMap<String, String>,
    pub doc: String,
}
