//! Assembles surviving node descriptors into an immutable graph.

use super::dag::FlowGraph;
use super::error::BuildError;
use super::node::Node;
use crate::config::Config;
use crate::declare::expand::NodeTemplate;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

/// Builds the graph from already-expanded, already-config-resolved
/// templates. Performs no execution.
///
/// Validation order: uniqueness first (the type check needs an
/// unambiguous name -> producer mapping), then static type
/// compatibility. Dependencies with no producer and no config leaf are
/// recorded as unresolved, to be supplied at execution time.
pub(crate) fn assemble(
    templates: Vec<NodeTemplate>,
    config: Config,
) -> Result<FlowGraph, BuildError> {
    let mut graph: DiGraph<Node, ()> =
        DiGraph::with_capacity(templates.len(), templates.len() * 2);
    let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(templates.len());
    let mut declared_in: HashMap<String, String> = HashMap::with_capacity(templates.len());

    for template in templates {
        if let Some(first) = declared_in.get(&template.name) {
            return Err(BuildError::DuplicateNode {
                name: template.name,
                first: first.clone(),
                second: template.module,
            });
        }
        declared_in.insert(template.name.clone(), template.module.clone());
        let node = Node {
            name: template.name.clone(),
            doc: template.doc,
            dependencies: template.dependencies,
            returns: template.returns,
            body: template.body,
            tags: template.tags,
            checks: template.checks,
            origin: template.origin,
        };
        let idx = graph.add_node(node);
        index.insert(template.name, idx);
    }

    let mut unresolved: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut edges = Vec::new();
    for idx in graph.node_indices() {
        let node = &graph[idx];
        for (dep, expected) in node.dependencies() {
            if let Some(&producer_idx) = index.get(dep) {
                let actual = graph[producer_idx].returns();
                if !expected.accepts(actual) {
                    return Err(BuildError::TypeMismatch {
                        consumer: node.name().to_string(),
                        dependency: dep.clone(),
                        producer: dep.clone(),
                        expected: *expected,
                        actual,
                    });
                }
                edges.push((producer_idx, idx));
            } else if let Some(actual) = config.leaf_kind(dep) {
                if !expected.accepts(actual) {
                    return Err(BuildError::TypeMismatch {
                        consumer: node.name().to_string(),
                        dependency: dep.clone(),
                        producer: format!("config:{dep}"),
                        expected: *expected,
                        actual,
                    });
                }
            } else {
                unresolved
                    .entry(dep.clone())
                    .or_default()
                    .push(node.name().to_string());
            }
        }
    }
    for (producer, consumer) in edges {
        graph.add_edge(producer, consumer, ());
    }

    log::debug!(
        "assembled graph: {} nodes, {} unresolved runtime inputs",
        graph.node_count(),
        unresolved.len()
    );
    Ok(FlowGraph::from_parts(graph, index, config, unresolved))
}
