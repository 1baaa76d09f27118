//! flowtable turns a collection of independently-declared functions into
//! a named, typed dependency graph, resolved on demand into aligned
//! output values: conceptually, columns of a table.
//!
//! Each declared function is one node: its name is the output key, its
//! parameters are upstream dependencies, its return kind is the node's
//! type. Decorators expand one declaration into zero, one, or many
//! nodes (parameterized variants, column extraction, delegation, model
//! binding, config gating, tagging, output validation). The graph is
//! assembled once with static name and type validation; execution is
//! per-call memoized depth-first resolution of only the requested
//! subgraph.
//!
//! # Example
//!
//! ```
//! use flowtable::{build, Config, FunctionDecl, Module, Value, ValueKind};
//!
//! let module = Module::new("marketing")
//!     .declare(
//!         FunctionDecl::new("spend")
//!             .returns(ValueKind::Series)
//!             .body(|_| Ok(Value::from(vec![10.0, 20.0, 40.0]))),
//!     )
//!     .declare(
//!         FunctionDecl::new("spend_doubled")
//!             .doc("Spend, doubled.")
//!             .param("spend", ValueKind::Series)
//!             .returns(ValueKind::Series)
//!             .body(|args| {
//!                 let spend = args.series("spend")?;
//!                 let doubled: Vec<f64> = spend.iter().map(|v| v * 2.0).collect();
//!                 Ok(Value::from(doubled))
//!             }),
//!     );
//!
//! let graph = build(Config::new(), [module])?;
//! let result = graph.execute(&["spend", "spend_doubled"])?;
//! assert_eq!(result.column("spend_doubled").unwrap().values(), &[20.0, 40.0, 80.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The graph is immutable once built and safe to share across threads;
//! each `execute` call carries its own memo. Rebuild the graph to pick
//! up config or module changes.

pub mod compute;
pub mod config;
pub mod declare;
pub mod display;
pub mod frame;
pub mod graph;
pub mod validation;

pub use compute::{ExecutionError, Executor, ResultSet};
pub use config::{Config, ConfigValue, Predicate};
pub use declare::{
    ColumnModel, ColumnSpec, Decorator, FunctionDecl, InputVariant, ModelFactory, Module, NodeFn,
    ValueVariant,
};
pub use display::{render_dot, visualize_execution, RenderConfig, RenderError};
pub use frame::{Arguments, NodeError, Series, Table, Value, ValueKind};
pub use graph::{BuildError, FlowGraph, Node, NodeOrigin, VariableInfo};
pub use validation::{CheckResult, DataValidator, Importance};

use std::collections::HashMap;

/// Builds a graph from a fixed configuration and an ordered collection
/// of declaration modules. Modules are scanned exactly once; any
/// build-time error aborts construction entirely.
pub fn build(
    config: Config,
    modules: impl IntoIterator<Item = Module>,
) -> Result<FlowGraph, BuildError> {
    FlowGraph::build(config, modules)
}

/// Convenience for a one-off execution with overrides.
///
/// Equivalent to `Executor::new(graph).execute(outputs, overrides, {})`.
pub fn execute(
    graph: &FlowGraph,
    outputs: &[&str],
    overrides: HashMap<String, Value>,
) -> Result<ResultSet, ExecutionError> {
    graph.execute_with(outputs, overrides, HashMap::new())
}
