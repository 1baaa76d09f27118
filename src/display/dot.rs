//! Graphviz DOT output for the upstream closure of requested outputs.

use crate::graph::dag::FlowGraph;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot render unknown output '{name}'")]
    UnknownOutput { name: String },

    #[error("failed writing render output: {0}")]
    Io(#[from] std::io::Error),
}

/// Presentation knobs for the DOT text.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub title: Option<String>,
    /// Annotate each node label with its output kind.
    pub include_kinds: bool,
    /// Lay the graph out left-to-right instead of top-down.
    pub left_to_right: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            title: None,
            include_kinds: true,
            left_to_right: false,
        }
    }
}

/// Renders the subgraph needed to resolve `outputs` as DOT text.
///
/// Nodes are boxes; dependencies with no producer (runtime inputs and
/// config leaves) appear as dashed ellipses. Every requested name must
/// be a node in the graph.
pub fn render_dot(
    graph: &FlowGraph,
    outputs: &[&str],
    config: &RenderConfig,
) -> Result<String, RenderError> {
    for name in outputs {
        if !graph.contains(name) {
            return Err(RenderError::UnknownOutput {
                name: name.to_string(),
            });
        }
    }

    // BTree collections keep the emitted text deterministic.
    let nodes: BTreeSet<String> = graph.upstream_of(outputs).into_iter().collect();
    let mut inputs: BTreeSet<String> = BTreeSet::new();
    let mut edges: BTreeSet<(String, String)> = BTreeSet::new();
    for name in &nodes {
        let node = graph
            .node(name)
            .expect("BUG: closure member vanished from the graph");
        for (dep, _) in node.dependencies() {
            edges.insert((dep.clone(), name.clone()));
            if !graph.contains(dep) {
                inputs.insert(dep.clone());
            }
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "digraph flowtable {{");
    if let Some(title) = &config.title {
        let _ = writeln!(out, "    label=\"{}\";", escape(title));
    }
    if config.left_to_right {
        let _ = writeln!(out, "    rankdir=LR;");
    }
    for name in &nodes {
        let node = graph
            .node(name)
            .expect("BUG: closure member vanished from the graph");
        let label = if config.include_kinds {
            format!("{}\\n[{}]", escape(name), node.returns())
        } else {
            escape(name)
        };
        let _ = writeln!(out, "    \"{}\" [shape=box, label=\"{label}\"];", escape(name));
    }
    for name in &inputs {
        let source = if graph.config().leaf_kind(name).is_some() {
            "config"
        } else {
            "input"
        };
        let _ = writeln!(
            out,
            "    \"{0}\" [shape=ellipse, style=dashed, label=\"{0}\\n({source})\"];",
            escape(name)
        );
    }
    for (from, to) in &edges {
        let _ = writeln!(out, "    \"{}\" -> \"{}\";", escape(from), escape(to));
    }
    let _ = writeln!(out, "}}");
    Ok(out)
}

/// Renders as [`render_dot`] and writes the text to `destination`.
pub fn visualize_execution(
    graph: &FlowGraph,
    outputs: &[&str],
    destination: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<(), RenderError> {
    let dot = render_dot(graph, outputs, config)?;
    std::fs::write(destination, dot)?;
    Ok(())
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
