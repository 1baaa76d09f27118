//! Function declarations and the decorator-expansion pipeline.
//!
//! A [`FunctionDecl`] is the explicit-registration rendition of a declared
//! function: name, typed ordered parameters, typed return, documentation,
//! the producing routine as a first-class closure, and a stack of
//! [`Decorator`]s. Expansion turns one declaration into zero, one, or many
//! node descriptors before graph assembly; the original declaration is
//! never mutated.

pub mod expand;
pub mod function;
pub mod inspector;
pub mod model;
pub mod resolve;

pub use function::{FunctionDecl, Module};
pub use model::{ColumnModel, ModelFactory};

use crate::config::Predicate;
use crate::frame::{Arguments, NodeError, Value};
use crate::validation::{DataValidator, Importance, OutputCheck};
use std::fmt;
use std::sync::Arc;

/// The producing routine of a node: the resolved dependency bundle in, one
/// value out. This single shape is also the only delegate shape `does`
/// accepts, by construction.
pub type NodeFn = Arc<dyn Fn(&Arguments) -> Result<Value, NodeError> + Send + Sync>;

/// One variant of a `parameterized` expansion: an output name, its
/// documentation, and the literal bound to the expanded parameter.
#[derive(Debug, Clone)]
pub struct ValueVariant {
    pub output: String,
    pub doc: String,
    pub value: Value,
}

impl ValueVariant {
    pub fn new(output: impl Into<String>, doc: impl Into<String>, value: impl Into<Value>) -> Self {
        ValueVariant {
            output: output.into(),
            doc: doc.into(),
            value: value.into(),
        }
    }
}

/// One variant of a `parameterized_inputs` expansion: an output name plus
/// `(parameter, upstream node)` bindings.
#[derive(Debug, Clone)]
pub struct InputVariant {
    pub output: String,
    pub bindings: Vec<(String, String)>,
}

impl InputVariant {
    pub fn new<P, U>(output: impl Into<String>, bindings: impl IntoIterator<Item = (P, U)>) -> Self
    where
        P: Into<String>,
        U: Into<String>,
    {
        InputVariant {
            output: output.into(),
            bindings: bindings
                .into_iter()
                .map(|(p, u)| (p.into(), u.into()))
                .collect(),
        }
    }
}

/// A column to extract from a table-producing node.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub doc: Option<String>,
}

impl ColumnSpec {
    pub fn documented(name: impl Into<String>, doc: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            doc: Some(doc.into()),
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        ColumnSpec {
            name: name.to_string(),
            doc: None,
        }
    }
}

/// A declarative decorator, applied innermost-first through
/// [`FunctionDecl::with`]. Each kind is a pure transformation of the raw
/// descriptor, run before graph assembly.
#[derive(Clone)]
pub enum Decorator {
    /// One node per variant, with the named parameter bound to a literal
    /// value instead of a graph edge.
    Parameterized {
        parameter: String,
        variants: Vec<ValueVariant>,
    },
    /// One node per variant, with dependencies rerouted to other upstream
    /// nodes. Docs are templated: `{param}` and the reserved
    /// `{output_name}` are substituted.
    ParameterizedInputs { variants: Vec<InputVariant> },
    /// The declared function keeps its table-producing node; one extra
    /// series node per column selects that column at execution time.
    ExtractColumns {
        columns: Vec<ColumnSpec>,
        fill_with: Option<f64>,
    },
    /// Replaces the body of a body-less stub declaration; dependencies
    /// still come from the stub's own parameter list.
    Does { delegate: NodeFn },
    /// Node computed by a model instantiated from the feature
    /// specification stored under `config_key`; dependencies are resolved
    /// dynamically from that instance.
    Model {
        factory: Arc<dyn ModelFactory>,
        config_key: String,
        output_column: Option<String>,
    },
    /// Gates the node on a configuration predicate. The public name
    /// becomes `rename` if set, else the declared name with a trailing
    /// `__variant` suffix stripped.
    When {
        predicate: Predicate,
        rename: Option<String>,
    },
    /// Opaque metadata, never interpreted by the engine.
    Tag { entries: Vec<(String, String)> },
    /// Post-execution output checks.
    CheckOutput {
        importance: Importance,
        checks: Vec<Arc<dyn DataValidator>>,
    },
}

impl Decorator {
    pub fn parameterized(parameter: impl Into<String>, variants: Vec<ValueVariant>) -> Self {
        Decorator::Parameterized {
            parameter: parameter.into(),
            variants,
        }
    }

    pub fn parameterized_inputs(variants: Vec<InputVariant>) -> Self {
        Decorator::ParameterizedInputs { variants }
    }

    pub fn extract_columns<C: Into<ColumnSpec>>(columns: impl IntoIterator<Item = C>) -> Self {
        Decorator::ExtractColumns {
            columns: columns.into_iter().map(Into::into).collect(),
            fill_with: None,
        }
    }

    /// As [`Decorator::extract_columns`], but a missing column is created
    /// filled with `fill` instead of failing at execution time.
    pub fn extract_columns_filled<C: Into<ColumnSpec>>(
        columns: impl IntoIterator<Item = C>,
        fill: f64,
    ) -> Self {
        Decorator::ExtractColumns {
            columns: columns.into_iter().map(Into::into).collect(),
            fill_with: Some(fill),
        }
    }

    pub fn does(
        delegate: impl Fn(&Arguments) -> Result<Value, NodeError> + Send + Sync + 'static,
    ) -> Self {
        Decorator::Does {
            delegate: Arc::new(delegate),
        }
    }

    pub fn model(factory: impl ModelFactory + 'static, config_key: impl Into<String>) -> Self {
        Decorator::Model {
            factory: Arc::new(factory),
            config_key: config_key.into(),
            output_column: None,
        }
    }

    pub fn model_as(
        factory: impl ModelFactory + 'static,
        config_key: impl Into<String>,
        output_column: impl Into<String>,
    ) -> Self {
        Decorator::Model {
            factory: Arc::new(factory),
            config_key: config_key.into(),
            output_column: Some(output_column.into()),
        }
    }

    pub fn when(predicate: Predicate) -> Self {
        Decorator::When {
            predicate,
            rename: None,
        }
    }

    /// Gate on a predicate and publish under an explicit name instead of
    /// the suffix-stripped declared name.
    pub fn when_named(name: impl Into<String>, predicate: Predicate) -> Self {
        Decorator::When {
            predicate,
            rename: Some(name.into()),
        }
    }

    pub fn tag<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Decorator::Tag {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn check_output(importance: Importance, checks: Vec<Arc<dyn DataValidator>>) -> Self {
        Decorator::CheckOutput { importance, checks }
    }

    pub(crate) fn attached_checks(importance: Importance, checks: &[Arc<dyn DataValidator>]) -> Vec<OutputCheck> {
        checks
            .iter()
            .map(|validator| OutputCheck {
                importance,
                validator: Arc::clone(validator),
            })
            .collect()
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decorator::Parameterized { parameter, variants } => f
                .debug_struct("Parameterized")
                .field("parameter", parameter)
                .field("variants", &variants.len())
                .finish(),
            Decorator::ParameterizedInputs { variants } => f
                .debug_struct("ParameterizedInputs")
                .field("variants", &variants.len())
                .finish(),
            Decorator::ExtractColumns { columns, fill_with } => f
                .debug_struct("ExtractColumns")
                .field("columns", &columns.len())
                .field("fill_with", fill_with)
                .finish(),
            Decorator::Does { .. } => f.write_str("Does(..)"),
            Decorator::Model { config_key, output_column, .. } => f
                .debug_struct("Model")
                .field("config_key", config_key)
                .field("output_column", output_column)
                .finish(),
            Decorator::When { predicate, rename } => f
                .debug_struct("When")
                .field("predicate", predicate)
                .field("rename", rename)
                .finish(),
            Decorator::Tag { entries } => f.debug_struct("Tag").field("entries", entries).finish(),
            Decorator::CheckOutput { importance, checks } => f
                .debug_struct("CheckOutput")
                .field("importance", importance)
                .field("checks", &checks.len())
                .finish(),
        }
    }
}
