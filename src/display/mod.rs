//! Diagnostics rendering of the resolved subgraph.
//!
//! This is a read-only collaborator: it consumes the graph's node/edge
//! structure and produces Graphviz DOT text, changing no engine state.
//! Actual rendering to an image belongs to external tooling.

pub mod dot;

pub use dot::{render_dot, visualize_execution, RenderConfig, RenderError};
