//! Graph assembly and the assembled graph itself.

pub(crate) mod builder;
pub mod dag;
pub mod error;
pub mod node;

pub use dag::FlowGraph;
pub use error::BuildError;
pub use node::{Node, NodeOrigin, VariableInfo};
