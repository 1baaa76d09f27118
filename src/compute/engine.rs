//! A synchronous, single-threaded execution engine.
//!
//! Resolution is recursive, depth-first, and memoized per call: only the
//! requested subgraph is touched, and every node body runs at most once
//! per call. There is no cycle pre-check; a cyclic chain exhausts the
//! recursion budget instead. That is an accepted, documented limitation
//! of the engine, not a guarded error path.

use super::ledger::{ExecutionError, Ledger};
use crate::frame::{Arguments, Table, Value};
use crate::graph::dag::FlowGraph;
use crate::validation;
use std::collections::HashMap;

pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

/// One executor per call site. The executor borrows the graph and holds
/// no state of its own between calls; concurrent calls against one graph
/// need one executor (or at least one call) each so memos are never
/// shared.
pub struct Executor<'a> {
    graph: &'a FlowGraph,
    recursion_limit: usize,
}

/// The assembled result of one call: an aligned table with one column
/// per requested series-valued name (in requested order), plus
/// standalone values for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub frame: Table,
    pub scalars: Vec<(String, Value)>,
}

impl ResultSet {
    pub fn column(&self, name: &str) -> Option<&crate::frame::Series> {
        self.frame.column(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.scalars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl<'a> Executor<'a> {
    pub fn new(graph: &'a FlowGraph) -> Self {
        Executor {
            graph,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Resolves `outputs` and assembles the result.
    ///
    /// Per-name resolution order: overrides, then the call's memo, then
    /// inputs (only for names with no producing node), then recursive
    /// resolution through the node. Config leaves are seeded into the
    /// memo up front; overrides are seeded after them and therefore win.
    pub fn execute(
        &self,
        outputs: &[&str],
        overrides: HashMap<String, Value>,
        inputs: HashMap<String, Value>,
    ) -> Result<ResultSet, ExecutionError> {
        let mut ledger = Ledger::new();
        for (name, value) in self.graph.config().leaves() {
            ledger.insert(name.to_string(), value);
        }
        for (name, value) in overrides {
            ledger.insert(name, value);
        }

        let mut resolved = Vec::with_capacity(outputs.len());
        for name in outputs {
            let value = self.resolve(name, &inputs, &mut ledger, 0, None)?;
            resolved.push((name.to_string(), value));
        }
        log::debug!(
            "resolved {} outputs with {} memo entries",
            resolved.len(),
            ledger.len()
        );
        assemble(resolved)
    }

    fn resolve(
        &self,
        name: &str,
        inputs: &HashMap<String, Value>,
        ledger: &mut Ledger,
        depth: usize,
        requested_by: Option<&str>,
    ) -> Result<Value, ExecutionError> {
        if depth > self.recursion_limit {
            return Err(ExecutionError::RecursionLimit {
                limit: self.recursion_limit,
                name: name.to_string(),
            });
        }
        // Covers overrides, config leaves, and anything already computed
        // this call.
        if let Some(value) = ledger.get(name) {
            return Ok(value.clone());
        }
        match self.graph.node(name) {
            Some(node) => {
                let mut args = Arguments::new();
                for (dep, _) in node.dependencies() {
                    let value = self.resolve(dep, inputs, ledger, depth + 1, Some(name))?;
                    args.push(dep.clone(), value);
                }
                log::debug!("computing node '{name}'");
                let value = (node.body)(&args).map_err(|source| ExecutionError::NodeFailed {
                    node: name.to_string(),
                    source,
                })?;
                // The value is published to dependents only after its
                // checks pass.
                validation::run_checks(name, &node.checks, &value)?;
                ledger.insert(name.to_string(), value.clone());
                Ok(value)
            }
            None => match inputs.get(name) {
                Some(value) => {
                    ledger.insert(name.to_string(), value.clone());
                    Ok(value.clone())
                }
                None => Err(ExecutionError::UnresolvedDependency {
                    name: name.to_string(),
                    requested_by: requested_by
                        .map(|r| format!("'{r}'"))
                        .unwrap_or_else(|| "the call".to_string()),
                }),
            },
        }
    }
}

/// Alignment check plus partition into table columns and standalone
/// values. All series-valued results must share one length.
fn assemble(resolved: Vec<(String, Value)>) -> Result<ResultSet, ExecutionError> {
    let lengths: Vec<(&str, usize)> = resolved
        .iter()
        .filter_map(|(name, value)| value.row_count().map(|len| (name.as_str(), len)))
        .collect();
    if let Some((_, first)) = lengths.first() {
        if lengths.iter().any(|(_, len)| len != first) {
            let details: Vec<String> = lengths
                .iter()
                .map(|(name, len)| format!("{name} has {len} rows"))
                .collect();
            return Err(ExecutionError::Alignment {
                details: details.join(", "),
            });
        }
    }

    let mut frame = Table::new();
    let mut scalars = Vec::new();
    for (name, value) in resolved {
        match value {
            Value::Series(series) => frame.insert(name, series),
            other => scalars.push((name, other)),
        }
    }
    Ok(ResultSet { frame, scalars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::declare::{Decorator, FunctionDecl, Module};
    use crate::frame::{NodeError, ValueKind};
    use crate::validation::rules::range;
    use crate::validation::Importance;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn series_node(name: &str, values: Vec<f64>) -> FunctionDecl {
        FunctionDecl::new(name)
            .returns(ValueKind::Series)
            .body(move |_| Ok(Value::from(values.clone())))
    }

    fn marketing_module() -> Module {
        Module::new("marketing")
            .declare(series_node("spend", vec![10.0, 10.0, 20.0, 40.0, 40.0, 50.0]))
            .declare(series_node(
                "signups",
                vec![1.0, 10.0, 50.0, 100.0, 200.0, 400.0],
            ))
            .declare(
                FunctionDecl::new("avg_3wk_spend")
                    .doc("Rolling 3-week average of spend.")
                    .param("spend", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| {
                        let spend = args.series("spend")?;
                        let values = spend.values();
                        let mut out = Vec::with_capacity(values.len());
                        for i in 0..values.len() {
                            if i < 2 {
                                out.push(f64::NAN);
                            } else {
                                out.push((values[i - 2] + values[i - 1] + values[i]) / 3.0);
                            }
                        }
                        Ok(Value::from(out))
                    }),
            )
            .declare(
                FunctionDecl::new("spend_per_signup")
                    .doc("Spend per signup.")
                    .param("spend", ValueKind::Series)
                    .param("signups", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| {
                        let spend = args.series("spend")?;
                        let signups = args.series("signups")?;
                        let out: Vec<f64> = spend
                            .iter()
                            .zip(signups.iter())
                            .map(|(s, n)| s / n)
                            .collect();
                        Ok(Value::from(out))
                    }),
            )
    }

    #[test]
    fn test_marketing_scenario_end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let graph = FlowGraph::build(Config::new(), [marketing_module()]).unwrap();
        let result = graph
            .execute(&["spend", "signups", "avg_3wk_spend", "spend_per_signup"])
            .unwrap();

        assert_eq!(result.frame.column_count(), 4);
        assert_eq!(result.frame.row_count(), 6);
        assert!(result.scalars.is_empty());

        let spend = result.column("spend").unwrap();
        let signups = result.column("signups").unwrap();
        let per_signup = result.column("spend_per_signup").unwrap();
        for i in 0..6 {
            assert_eq!(
                per_signup.get(i).unwrap(),
                spend.get(i).unwrap() / signups.get(i).unwrap()
            );
        }

        let avg = result.column("avg_3wk_spend").unwrap();
        assert!(avg.is_undefined(0));
        assert!(avg.is_undefined(1));
        assert_eq!(avg.get(2).unwrap(), (10.0 + 10.0 + 20.0) / 3.0);
        assert_eq!(avg.get(5).unwrap(), (40.0 + 40.0 + 50.0) / 3.0);
    }

    #[test]
    fn test_only_requested_subgraph_is_resolved() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let module = Module::new("m")
            .declare(series_node("wanted", vec![1.0]))
            .declare(FunctionDecl::new("unwanted").returns(ValueKind::Float).body(
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Float(0.0))
                },
            ));
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        graph.execute(&["wanted"]).unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shared_dependency_is_invoked_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let module = Module::new("m")
            .declare(
                FunctionDecl::new("base")
                    .returns(ValueKind::Series)
                    .body(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::from(vec![1.0, 2.0]))
                    }),
            )
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
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        graph.execute(&["left", "right"]).unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);

        // A fresh call gets a fresh memo: the node runs again.
        graph.execute(&["left"]).unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_override_suppresses_node_invocation() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let module = Module::new("m")
            .declare(
                FunctionDecl::new("base")
                    .returns(ValueKind::Series)
                    .body(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::from(vec![1.0]))
                    }),
            )
            .declare(
                FunctionDecl::new("doubled")
                    .param("base", ValueKind::Series)
                    .returns(ValueKind::Series)
                    .body(|args| {
                        let base = args.series("base")?;
                        Ok(Value::from(
                            base.iter().map(|v| v * 2.0).collect::<Vec<f64>>(),
                        ))
                    }),
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let overrides = HashMap::from([("base".to_string(), Value::from(vec![5.0]))]);
        let result = graph
            .execute_with(&["doubled"], overrides, HashMap::new())
            .unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        assert_eq!(result.column("doubled").unwrap().values(), &[10.0]);
    }

    #[test]
    fn test_cycle_hits_recursion_limit() {
        let module = Module::new("m")
            .declare(
                FunctionDecl::new("a")
                    .param("b", ValueKind::Float)
                    .returns(ValueKind::Float)
                    .body(|args| Ok(Value::Float(args.float("b")?))),
            )
            .declare(
                FunctionDecl::new("b")
                    .param("a", ValueKind::Float)
                    .returns(ValueKind::Float)
                    .body(|args| Ok(Value::Float(args.float("a")?))),
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let err = Executor::new(&graph)
            .with_recursion_limit(64)
            .execute(&["a"], HashMap::new(), HashMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::RecursionLimit { limit: 64, .. }
        ));
    }

    #[test]
    fn test_unresolved_names() {
        let module = Module::new("m").declare(
            FunctionDecl::new("consumer")
                .param("ghost", ValueKind::Float)
                .returns(ValueKind::Float)
                .body(|args| Ok(Value::Float(args.float("ghost")?))),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();

        match graph.execute(&["missing"]).unwrap_err() {
            ExecutionError::UnresolvedDependency { name, requested_by } => {
                assert_eq!(name, "missing");
                assert_eq!(requested_by, "the call");
            }
            other => panic!("wrong error: {other:?}"),
        }
        match graph.execute(&["consumer"]).unwrap_err() {
            ExecutionError::UnresolvedDependency { name, requested_by } => {
                assert_eq!(name, "ghost");
                assert_eq!(requested_by, "'consumer'");
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_inputs_fill_missing_producers_only() {
        let module = Module::new("m")
            .declare(series_node("produced", vec![1.0, 2.0]))
            .declare(
                FunctionDecl::new("total")
                    .param("produced", ValueKind::Series)
                    .param("supplied", ValueKind::Series)
                    .returns(ValueKind::Float)
                    .body(|args| {
                        let a: f64 = args.series("produced")?.iter().sum();
                        let b: f64 = args.series("supplied")?.iter().sum();
                        Ok(Value::Float(a + b))
                    }),
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let inputs = HashMap::from([
            ("supplied".to_string(), Value::from(vec![10.0])),
            // Has a producing node, so this entry must be ignored.
            ("produced".to_string(), Value::from(vec![100.0])),
        ]);
        let result = graph
            .execute_with(&["total"], HashMap::new(), inputs)
            .unwrap();
        assert_eq!(result.scalar("total"), Some(&Value::Float(13.0)));
    }

    #[test]
    fn test_config_leaves_resolve_and_overrides_win() {
        let config = Config::new().set("window", 3);
        let module = Module::new("m").declare(
            FunctionDecl::new("window_echo")
                .param("window", ValueKind::Int)
                .returns(ValueKind::Int)
                .body(|args| Ok(Value::Int(args.int("window")?))),
        );
        let graph = FlowGraph::build(config, [module]).unwrap();

        let result = graph.execute(&["window_echo"]).unwrap();
        assert_eq!(result.scalar("window_echo"), Some(&Value::Int(3)));

        let overrides = HashMap::from([("window".to_string(), Value::Int(5))]);
        let result = graph
            .execute_with(&["window_echo"], overrides, HashMap::new())
            .unwrap();
        assert_eq!(result.scalar("window_echo"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_alignment_failure() {
        let module = Module::new("m")
            .declare(series_node("short", vec![1.0, 2.0]))
            .declare(series_node("long", vec![1.0, 2.0, 3.0]));
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        match graph.execute(&["short", "long"]).unwrap_err() {
            ExecutionError::Alignment { details } => {
                assert!(details.contains("short has 2 rows"), "details: {details}");
                assert!(details.contains("long has 3 rows"), "details: {details}");
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_failing_range_check_aborts_call() {
        let module = Module::new("m").declare(
            FunctionDecl::new("acquisition_cost")
                .returns(ValueKind::Float)
                .body(|_| Ok(Value::Float(150.0)))
                .with(Decorator::check_output(
                    Importance::Fail,
                    vec![range(0.0, 100.0)],
                )),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        match graph.execute(&["acquisition_cost"]).unwrap_err() {
            ExecutionError::ValidationFailure { node, .. } => {
                assert_eq!(node, "acquisition_cost");
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_warn_check_returns_value() {
        let module = Module::new("m").declare(
            FunctionDecl::new("acquisition_cost")
                .returns(ValueKind::Float)
                .body(|_| Ok(Value::Float(150.0)))
                .with(Decorator::check_output(
                    Importance::Warn,
                    vec![range(0.0, 100.0)],
                )),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let result = graph.execute(&["acquisition_cost"]).unwrap();
        assert_eq!(result.scalar("acquisition_cost"), Some(&Value::Float(150.0)));
    }

    #[test]
    fn test_node_body_failure_names_the_node() {
        let module = Module::new("m").declare(
            FunctionDecl::new("broken")
                .returns(ValueKind::Float)
                .body(|_| Err(NodeError::failed("upstream service unavailable"))),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        match graph.execute(&["broken"]).unwrap_err() {
            ExecutionError::NodeFailed { node, source } => {
                assert_eq!(node, "broken");
                assert_eq!(source, NodeError::failed("upstream service unavailable"));
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_extracted_columns_resolve_through_their_table() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let module = Module::new("m").declare(
            FunctionDecl::new("raw_frame")
                .returns(ValueKind::Table)
                .body(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Table(
                        crate::frame::Table::new()
                            .with_column("spend", vec![10.0, 20.0])
                            .with_column("signups", vec![1.0, 2.0]),
                    ))
                })
                .with(Decorator::extract_columns(["spend", "signups"])),
        );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let result = graph.execute(&["spend", "signups"]).unwrap();
        assert_eq!(result.column("spend").unwrap().values(), &[10.0, 20.0]);
        assert_eq!(result.column("signups").unwrap().values(), &[1.0, 2.0]);
        // Both columns come out of a single table materialization.
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_node_executes_from_config_spec() {
        use crate::declare::model::test_support::weighted_sum_factory;
        let config = Config::new().set(
            "acquisition_model",
            serde_json::json!({"spend": 0.5, "signups": 2.0}),
        );
        let module = Module::new("m")
            .declare(series_node("spend", vec![2.0, 4.0]))
            .declare(series_node("signups", vec![1.0, 1.0]))
            .declare(
                FunctionDecl::new("acquisitions")
                    .returns(ValueKind::Series)
                    .with(Decorator::model(weighted_sum_factory, "acquisition_model")),
            );
        let graph = FlowGraph::build(config, [module]).unwrap();
        let result = graph.execute(&["acquisitions"]).unwrap();
        assert_eq!(result.column("acquisitions").unwrap().values(), &[3.0, 4.0]);
    }

    #[test]
    fn test_mixed_series_and_scalar_outputs() {
        let module = Module::new("m")
            .declare(series_node("spend", vec![1.0, 2.0]))
            .declare(
                FunctionDecl::new("total_spend")
                    .param("spend", ValueKind::Series)
                    .returns(ValueKind::Float)
                    .body(|args| Ok(Value::Float(args.series("spend")?.iter().sum()))),
            );
        let graph = FlowGraph::build(Config::new(), [module]).unwrap();
        let result = graph.execute(&["spend", "total_spend"]).unwrap();
        assert_eq!(result.frame.column_count(), 1);
        assert_eq!(result.scalars.len(), 1);
        assert_eq!(result.scalar("total_spend"), Some(&Value::Float(3.0)));
    }
}
