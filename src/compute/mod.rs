//! Per-call resolution of the graph.

pub mod engine;
pub mod ledger;

pub use engine::{Executor, ResultSet, DEFAULT_RECURSION_LIMIT};
pub use ledger::ExecutionError;
