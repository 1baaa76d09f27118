//! Model-backed nodes.
//!
//! A model's dependencies are not declared on the function; they come from
//! the feature specification stored in the configuration. The declaration
//! is a parameterless, body-less stub; the instantiated model is both the
//! dependency list and the producing routine.

use crate::config::ConfigValue;
use crate::frame::{Arguments, NodeError, Value};

/// A computation whose inputs are decided by configuration.
pub trait ColumnModel: Send + Sync {
    /// Upstream node names this model consumes, in resolution order.
    fn dependencies(&self) -> Vec<String>;

    fn compute(&self, args: &Arguments) -> Result<Value, NodeError>;
}

/// Builds a [`ColumnModel`] from the feature specification found under the
/// decorator's config key. `output_name` is the resolved output name of
/// the node, available for models that derive state from it.
///
/// Implemented for plain closures of the same shape.
pub trait ModelFactory: Send + Sync {
    fn instantiate(
        &self,
        spec: &ConfigValue,
        output_name: &str,
    ) -> Result<Box<dyn ColumnModel>, String>;
}

impl<F> ModelFactory for F
where
    F: Fn(&ConfigValue, &str) -> Result<Box<dyn ColumnModel>, String> + Send + Sync,
{
    fn instantiate(
        &self,
        spec: &ConfigValue,
        output_name: &str,
    ) -> Result<Box<dyn ColumnModel>, String> {
        self(spec, output_name)
    }
}
