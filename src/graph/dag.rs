//! The immutable, name-keyed dependency graph.

use super::builder;
use super::error::BuildError;
use super::node::{Node, VariableInfo};
use crate::compute::engine::{Executor, ResultSet};
use crate::compute::ledger::ExecutionError;
use crate::config::Config;
use crate::declare::{expand, inspector, resolve, Module};
use crate::frame::Value;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// The assembled graph: nodes keyed by output name, edges from producer
/// to consumer. Contains no execution state; rebuilding is the only way
/// to pick up config or module changes. Safe to share across concurrent
/// executions because every call carries its own memo.
#[derive(Debug)]
pub struct FlowGraph {
    pub(crate) graph: DiGraph<Node, ()>,
    pub(crate) index: HashMap<String, NodeIndex>,
    config: Config,
    /// Dependency names with no producer at build time, mapped to their
    /// consumers. Supplied as inputs at execution time or failed lazily.
    unresolved: BTreeMap<String, Vec<String>>,
}

impl FlowGraph {
    /// Scans `modules` exactly once, in order, and builds the graph:
    /// inspection, decorator expansion, config resolution, assembly.
    /// Any error aborts construction entirely.
    pub fn build(
        config: Config,
        modules: impl IntoIterator<Item = Module>,
    ) -> Result<Self, BuildError> {
        let mut templates = Vec::new();
        for module in modules {
            for decl in module.functions {
                if let Some(raw) = inspector::inspect(decl)? {
                    templates.extend(expand::expand(raw, &config, &module.name)?);
                }
            }
        }
        let survivors = resolve::resolve_variants(templates, &config)?;
        builder::assemble(survivors, config)
    }

    pub(crate) fn from_parts(
        graph: DiGraph<Node, ()>,
        index: HashMap<String, NodeIndex>,
        config: Config,
        unresolved: BTreeMap<String, Vec<String>>,
    ) -> Self {
        FlowGraph {
            graph,
            index,
            config,
            unresolved,
        }
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|idx| &self.graph[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names that must be supplied at execution time, with the nodes that
    /// consume them.
    pub fn unresolved_dependencies(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.unresolved
            .iter()
            .map(|(name, consumers)| (name.as_str(), consumers.as_slice()))
    }

    /// One descriptor per node surviving config resolution, in assembly
    /// order. The tag mapping enables external filtering.
    pub fn available_variables(&self) -> Vec<VariableInfo> {
        self.graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                VariableInfo {
                    name: node.name().to_string(),
                    kind: node.returns(),
                    tags: node.tags().clone(),
                    doc: node.doc().to_string(),
                }
            })
            .collect()
    }

    /// Names of all nodes upstream of (and including) the given outputs,
    /// following producer edges. Names with no node are ignored.
    pub fn upstream_of(&self, outputs: &[&str]) -> HashSet<String> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = outputs
            .iter()
            .filter_map(|name| self.index.get(*name).copied())
            .collect();
        while let Some(idx) = queue.pop_front() {
            if visited.insert(idx) {
                for parent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                    queue.push_back(parent);
                }
            }
        }
        visited
            .into_iter()
            .map(|idx| self.graph[idx].name().to_string())
            .collect()
    }

    /// Resolves the requested names with no overrides and no inputs.
    pub fn execute(&self, outputs: &[&str]) -> Result<ResultSet, ExecutionError> {
        Executor::new(self).execute(outputs, HashMap::new(), HashMap::new())
    }

    /// Full execution contract: caller overrides replace node results and
    /// suppress their invocation; inputs supply values for names with no
    /// producer.
    pub fn execute_with(
        &self,
        outputs: &[&str],
        overrides: HashMap<String, Value>,
        inputs: HashMap<String, Value>,
    ) -> Result<ResultSet, ExecutionError> {
        Executor::new(self).execute(outputs, overrides, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Predicate;
    use crate::declare::{Decorator, FunctionDecl};
    use crate::frame::ValueKind;
    use serde_json::json;

    fn series_node(name: &str, values: Vec<f64>) -> FunctionDecl {
        FunctionDecl::new(name)
            .returns(ValueKind::Series)
            .body(move |_| Ok(Value::from(values.clone())))
    }

    #[test]
    fn test_build_and_introspect() {
        let module = Module::new("marketing")
            .declare(series_node("spend", vec![1.0]).with(Decorator::tag([("team", "growth")])))
            .declare(
                FunctionDecl::new("total_spend")
                    .doc("Sum of spend.")
                    .param("spend", ValueKind::Series)
                    .returns(ValueKind::Float)
                    .body(|args| Ok(Value::Float(args.series("spend")?.iter().sum()))),
            )
            .declare(FunctionDecl::new("_helper").returns(ValueKind::Float));
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        assert_eq!(graph.node_count(), 2);

        let variables = graph.available_variables();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].name, "spend");
        assert_eq!(variables[0].tags.get("team").unwrap(), "growth");
        assert_eq!(variables[1].kind, ValueKind::Float);
        assert_eq!(variables[1].doc, "Sum of spend.");
    }

    #[test]
    fn test_duplicate_names_across_modules() {
        let first = Module::new("a").declare(series_node("spend", vec![1.0]));
        let second = Module::new("b").declare(series_node("spend", vec![2.0]));
        match FlowGraph::build(Config::new(), [first, second]).unwrap_err() {
            BuildError::DuplicateNode {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "spend");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_static_type_mismatch() {
        let module = Module::new("m")
            .declare(series_node("spend", vec![1.0]))
            .declare(
                FunctionDecl::new("bad")
                    .param("spend", ValueKind::Float)
                    .returns(ValueKind::Float)
                    .body(|args| Ok(Value::Float(args.float("spend")?))),
            );
        match FlowGraph::build(Config::new(), [module]).unwrap_err() {
            BuildError::TypeMismatch {
                consumer,
                dependency,
                expected,
                actual,
                ..
            } => {
                assert_eq!(consumer, "bad");
                assert_eq!(dependency, "spend");
                assert_eq!(expected, ValueKind::Float);
                assert_eq!(actual, ValueKind::Series);
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_any_accepts_every_producer() {
        let module = Module::new("m")
            .declare(series_node("spend", vec![1.0]))
            .declare(
                FunctionDecl::new("passthrough")
                    .param("spend", ValueKind::Any)
                    .returns(ValueKind::Any)
                    .body(|args| Ok(args.get("spend")?.clone())),
            );
        assert!(FlowGraph::build(Config::new(), [module]).is_ok());
    }

    #[test]
    fn test_config_leaf_kind_is_checked() {
        let config = Config::new().set("window", "three");
        let module = Module::new("m").declare(
            FunctionDecl::new("windowed")
                .param("window", ValueKind::Int)
                .returns(ValueKind::Int)
                .body(|args| Ok(Value::Int(args.int("window")?))),
        );
        match FlowGraph::build(config, [module]).unwrap_err() {
            BuildError::TypeMismatch {
                producer, actual, ..
            } => {
                assert_eq!(producer, "config:window");
                assert_eq!(actual, ValueKind::Str);
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_producers_are_recorded_not_rejected() {
        let module = Module::new("m").declare(
            FunctionDecl::new("spend_per_signup")
                .param("spend", ValueKind::Series)
                .param("signups", ValueKind::Series)
                .returns(ValueKind::Series)
                .body(|args| Ok(args.get("spend")?.clone())),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let unresolved: Vec<&str> = graph.unresolved_dependencies().map(|(n, _)| n).collect();
        assert_eq!(unresolved, vec!["signups", "spend"]);
    }

    #[test]
    fn test_predicate_exhaustion_omits_name_at_build() {
        let config = Config::new().set("region", "de");
        let module = Module::new("m")
            .declare(
                series_node("tax__us", vec![1.0])
                    .with(Decorator::when(Predicate::when([("region", "us")]))),
            )
            .declare(
                series_node("tax__uk", vec![2.0])
                    .with(Decorator::when(Predicate::when([("region", "uk")]))),
            );
        let graph = FlowGraph::build(config, [module]).unwrap();
        assert!(!graph.contains("tax"));
        // The omission only bites lazily, at execution time.
        assert!(matches!(
            graph.execute(&["tax"]).unwrap_err(),
            ExecutionError::UnresolvedDependency { .. }
        ));
    }

    #[test]
    fn test_upstream_closure_over_a_diamond() {
        // Shape: base -> left, base -> right, left+right -> top.
        let module = Module::new("m")
            .declare(series_node("base", vec![1.0]))
            .declare(
                FunctionDecl::new("left")
                    .param("base", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| Ok(args.get("base")?.clone())),
            )
            .declare(
                FunctionDecl::new("right")
                    .param("base", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| Ok(args.get("base")?.clone())),
            )
            .declare(
                FunctionDecl::new("top")
                    .param("left", ValueKind::Series)
                    .param("right", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| Ok(args.get("left")?.clone())),
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();

        let closure = graph.upstream_of(&["top"]);
        let mut names: Vec<&str> = closure.iter().map(|n| n.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["base", "left", "right", "top"]);

        let partial = graph.upstream_of(&["left"]);
        assert!(partial.contains("base"));
        assert!(!partial.contains("right"));
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let build = || {
            let config = Config::new().set("m", json!({"spend": 1.0}));
            let module = Module::new("m")
                .declare(series_node("spend", vec![1.0]))
                .declare(
                    FunctionDecl::new("scaled")
                        .param("spend", ValueKind::Series)
                        .param("factor", ValueKind::Float)
                        .returns(ValueKind::Series)
                        .body(|args| Ok(args.get("spend")?.clone()))
                        .with(Decorator::parameterized(
                            "factor",
                            vec![
                                crate::declare::ValueVariant::new("scaled_x1", "x1", 1.0),
                                crate::declare::ValueVariant::new("scaled_x2", "x2", 2.0),
                            ],
                        )),
                );
            FlowGraph::build(config, [module]).unwrap()
        };
        let a = build();
        let b = build();
        let describe = |g: &FlowGraph| {
            g.available_variables()
                .into_iter()
                .map(|v| (v.name, v.kind, v.doc))
                .collect::<Vec<_>>()
        };
        assert_eq!(describe(&a), describe(&b));
    }
}
