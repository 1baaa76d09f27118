//! The decorator-expansion pipeline: one raw descriptor in, a list of
//! node descriptors (plus optional config predicate) out.
//!
//! Expansion is pure and deterministic: identical decorator arguments
//! always produce identical name/dependency/doc sets. Bodies are wrapped,
//! never mutated.

use super::inspector::RawFunction;
use super::{ColumnSpec, Decorator, InputVariant, NodeFn, ValueVariant};
use crate::config::{Config, Predicate};
use crate::frame::{Arguments, NodeError, Value, ValueKind};
use crate::graph::error::BuildError;
use crate::graph::node::{DependencyList, NodeOrigin};
use crate::validation::OutputCheck;
use smallvec::smallvec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A fully expanded node descriptor, ready for config resolution and
/// graph assembly.
pub(crate) struct NodeTemplate {
    pub name: String,
    pub doc: String,
    pub dependencies: DependencyList,
    pub returns: ValueKind,
    pub body: NodeFn,
    pub tags: BTreeMap<String, String>,
    pub checks: Vec<OutputCheck>,
    pub origin: NodeOrigin,
    pub predicate: Option<Predicate>,
    /// The module the declaration came from, for error messages.
    pub module: String,
}

impl std::fmt::Debug for NodeTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTemplate")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("dependencies", &self.dependencies)
            .field("returns", &self.returns)
            .field("body", &"<fn>")
            .field("tags", &self.tags)
            .field("checks", &format_args!("[{} checks]", self.checks.len()))
            .field("origin", &self.origin)
            .field("predicate", &self.predicate.as_ref().map(|_| "<predicate>"))
            .field("module", &self.module)
            .finish()
    }
}

/// The descriptor state between creator resolution and expander
/// application.
struct Base {
    name: String,
    doc: String,
    deps: DependencyList,
    returns: ValueKind,
    body: NodeFn,
    origin: NodeOrigin,
}

/// Expands one inspected declaration into its node templates.
pub(crate) fn expand(
    raw: RawFunction,
    config: &Config,
    module: &str,
) -> Result<Vec<NodeTemplate>, BuildError> {
    let RawFunction {
        name,
        doc,
        params,
        returns,
        body,
        decorators,
    } = raw;

    let mut creators = Vec::new();
    let mut expanders = Vec::new();
    let mut predicates = Vec::new();
    let mut rename = None;
    let mut tags = BTreeMap::new();
    let mut checks = Vec::new();

    for decorator in decorators {
        match decorator {
            Decorator::Does { .. } | Decorator::Model { .. } => creators.push(decorator),
            Decorator::Parameterized { .. }
            | Decorator::ParameterizedInputs { .. }
            | Decorator::ExtractColumns { .. } => expanders.push(decorator),
            Decorator::When {
                predicate,
                rename: target,
            } => {
                predicates.push(predicate);
                if rename.is_none() {
                    rename = target;
                }
            }
            Decorator::Tag { entries } => {
                for (key, value) in entries {
                    validate_tag_key(&name, &key)?;
                    tags.insert(key, value);
                }
            }
            Decorator::CheckOutput {
                importance,
                checks: validators,
            } => checks.extend(Decorator::attached_checks(importance, &validators)),
        }
    }

    if creators.len() > 1 {
        return Err(BuildError::DecoratorConfiguration {
            function: name,
            message: "at most one of does/model may be applied".to_string(),
        });
    }
    if expanders.len() > 1 {
        return Err(BuildError::DecoratorConfiguration {
            function: name,
            message: "at most one expanding decorator may be applied".to_string(),
        });
    }

    // Config-gated variants publish under a shared name: an explicit
    // rename, or the declared name with its `__variant` suffix stripped.
    let public_name = if predicates.is_empty() {
        name.clone()
    } else {
        match rename {
            Some(target) => target,
            None => {
                let stripped = strip_variant_suffix(&name);
                if stripped.is_empty() {
                    return Err(BuildError::Configuration {
                        function: name,
                        message: "variant name strips to nothing".to_string(),
                    });
                }
                stripped.to_string()
            }
        }
    };

    let base = match creators.pop() {
        None => {
            let body = body.ok_or_else(|| BuildError::Configuration {
                function: name.clone(),
                message: "missing body".to_string(),
            })?;
            Base {
                name: public_name,
                doc,
                deps: params,
                returns,
                body,
                origin: NodeOrigin::Declared,
            }
        }
        Some(Decorator::Does { delegate }) => {
            if body.is_some() {
                return Err(BuildError::DecoratorConfiguration {
                    function: name,
                    message: "does requires a body-less stub".to_string(),
                });
            }
            Base {
                name: public_name,
                doc,
                deps: params,
                returns,
                body: delegate,
                origin: NodeOrigin::Delegated,
            }
        }
        Some(Decorator::Model {
            factory,
            config_key,
            output_column,
        }) => {
            if body.is_some() {
                return Err(BuildError::DecoratorConfiguration {
                    function: name,
                    message: "model requires a body-less stub".to_string(),
                });
            }
            if !params.is_empty() {
                return Err(BuildError::DecoratorConfiguration {
                    function: name,
                    message: "model stubs take no parameters; dependencies come from the config"
                        .to_string(),
                });
            }
            if returns != ValueKind::Series {
                return Err(BuildError::DecoratorConfiguration {
                    function: name,
                    message: "model stubs must declare a Series return".to_string(),
                });
            }
            let spec = config
                .get(&config_key)
                .ok_or_else(|| BuildError::DecoratorConfiguration {
                    function: name.clone(),
                    message: format!("configuration has no entry '{config_key}'"),
                })?;
            // All later name derivation uses the resolved output name.
            let resolved_name = output_column.unwrap_or(public_name);
            let model = factory.instantiate(spec, &resolved_name).map_err(|e| {
                BuildError::DecoratorConfiguration {
                    function: name.clone(),
                    message: format!("model instantiation failed: {e}"),
                }
            })?;
            let deps: DependencyList = model
                .dependencies()
                .into_iter()
                .map(|dep| (dep, ValueKind::Series))
                .collect();
            Base {
                name: resolved_name,
                doc,
                deps,
                returns,
                body: Arc::new(move |args| model.compute(args)),
                origin: NodeOrigin::Model,
            }
        }
        Some(_) => unreachable!("non-creator in creator partition"),
    };

    let mut templates = match expanders.pop() {
        None => vec![into_template(base)],
        Some(Decorator::Parameterized {
            parameter,
            variants,
        }) => expand_parameterized(base, parameter, variants)?,
        Some(Decorator::ParameterizedInputs { variants }) => expand_inputs(base, variants)?,
        Some(Decorator::ExtractColumns { columns, fill_with }) => {
            expand_columns(base, columns, fill_with)?
        }
        Some(_) => unreachable!("non-expander in expander partition"),
    };

    // A validator that can run against none of the produced kinds is a
    // decorator misconfiguration, not a silent no-op.
    for check in checks {
        let applicable: Vec<usize> = templates
            .iter()
            .enumerate()
            .filter(|(_, t)| check.validator.applies_to(t.returns))
            .map(|(i, _)| i)
            .collect();
        if applicable.is_empty() {
            return Err(BuildError::DecoratorConfiguration {
                function: name.clone(),
                message: format!(
                    "validator '{}' applies to none of the produced nodes",
                    check.validator.name()
                ),
            });
        }
        for i in applicable {
            templates[i].checks.push(check.clone());
        }
    }

    let predicate = combine_predicates(predicates);
    for template in &mut templates {
        template.tags = tags.clone();
        template.predicate = predicate.clone();
        template.module = module.to_string();
    }
    Ok(templates)
}

fn into_template(base: Base) -> NodeTemplate {
    NodeTemplate {
        name: base.name,
        doc: base.doc,
        dependencies: base.deps,
        returns: base.returns,
        body: base.body,
        tags: BTreeMap::new(),
        checks: Vec::new(),
        origin: base.origin,
        predicate: None,
        module: String::new(),
    }
}

fn expand_parameterized(
    base: Base,
    parameter: String,
    variants: Vec<ValueVariant>,
) -> Result<Vec<NodeTemplate>, BuildError> {
    if !base.deps.iter().any(|(n, _)| *n == parameter) {
        return Err(BuildError::DecoratorConfiguration {
            function: base.name,
            message: format!("no such parameter '{parameter}' to parameterize"),
        });
    }
    let deps: DependencyList = base
        .deps
        .iter()
        .filter(|(n, _)| *n != parameter)
        .cloned()
        .collect();
    Ok(variants
        .into_iter()
        .map(|variant| {
            let inner = Arc::clone(&base.body);
            let bound_name = parameter.clone();
            let literal = variant.value;
            into_template(Base {
                name: variant.output,
                doc: variant.doc,
                deps: deps.clone(),
                returns: base.returns,
                body: Arc::new(move |args: &Arguments| {
                    // The parameter is a bound constant, not a graph edge.
                    let extended = args.clone().with(bound_name.clone(), literal.clone());
                    inner(&extended)
                }),
                origin: NodeOrigin::Parameterized {
                    base: base.name.clone(),
                },
            })
        })
        .collect())
}

fn expand_inputs(base: Base, variants: Vec<InputVariant>) -> Result<Vec<NodeTemplate>, BuildError> {
    let mut out = Vec::with_capacity(variants.len());
    for variant in variants {
        for (param, _) in &variant.bindings {
            if !base.deps.iter().any(|(n, _)| n == param) {
                return Err(BuildError::DecoratorConfiguration {
                    function: base.name.clone(),
                    message: format!("no such parameter '{param}' to rebind"),
                });
            }
        }
        let deps: DependencyList = base
            .deps
            .iter()
            .map(|(n, k)| {
                match variant
                    .bindings
                    .iter()
                    .find(|(param, _)| param == n)
                {
                    Some((_, upstream)) => (upstream.clone(), *k),
                    None => (n.clone(), *k),
                }
            })
            .collect();
        let doc = format_doc(&base.doc, &variant.output, &variant.bindings);
        let inner = Arc::clone(&base.body);
        let bindings = variant.bindings.clone();
        out.push(into_template(Base {
            name: variant.output,
            doc,
            deps,
            returns: base.returns,
            body: Arc::new(move |args: &Arguments| {
                // Hand the inner body its original parameter names.
                let mut remapped = Arguments::new();
                for (param, upstream) in &bindings {
                    remapped.push(param.clone(), args.get(upstream)?.clone());
                }
                for (name, value) in args.iter() {
                    if !bindings.iter().any(|(_, upstream)| upstream == name) {
                        remapped.push(name, value.clone());
                    }
                }
                inner(&remapped)
            }),
            origin: NodeOrigin::BoundInputs {
                base: base.name.clone(),
            },
        }));
    }
    Ok(out)
}

fn expand_columns(
    base: Base,
    columns: Vec<ColumnSpec>,
    fill_with: Option<f64>,
) -> Result<Vec<NodeTemplate>, BuildError> {
    if base.returns != ValueKind::Table {
        return Err(BuildError::DecoratorConfiguration {
            function: base.name,
            message: format!(
                "extract_columns requires a Table return, not {}",
                base.returns
            ),
        });
    }
    if columns.is_empty() {
        return Err(BuildError::DecoratorConfiguration {
            function: base.name,
            message: "extract_columns needs at least one column".to_string(),
        });
    }

    let table_body: NodeFn = match fill_with {
        None => Arc::clone(&base.body),
        Some(fill) => {
            let inner = Arc::clone(&base.body);
            let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
            Arc::new(move |args: &Arguments| {
                let value = inner(args)?;
                let Value::Table(mut table) = value else {
                    return Ok(value);
                };
                let rows = table.row_count();
                for name in &names {
                    if table.column(name).is_none() {
                        table.insert(name.clone(), vec![fill; rows]);
                    }
                }
                Ok(Value::Table(table))
            })
        }
    };

    // The declared function keeps its own table node; the extracted
    // columns each depend on it.
    let mut out = vec![into_template(Base {
        name: base.name.clone(),
        doc: base.doc.clone(),
        deps: base.deps.clone(),
        returns: ValueKind::Table,
        body: table_body,
        origin: base.origin.clone(),
    })];

    for column in columns {
        let table_name = base.name.clone();
        let column_name = column.name.clone();
        out.push(into_template(Base {
            name: column.name,
            doc: column.doc.unwrap_or_else(|| base.doc.clone()),
            deps: smallvec![(base.name.clone(), ValueKind::Table)],
            returns: ValueKind::Series,
            body: Arc::new(move |args: &Arguments| {
                let table = args.table(&table_name)?;
                table
                    .column(&column_name)
                    .cloned()
                    .map(Value::Series)
                    .ok_or_else(|| NodeError::MissingColumn {
                        column: column_name.clone(),
                        table: table_name.clone(),
                        available: table.column_names().collect::<Vec<_>>().join(", "),
                    })
            }),
            origin: NodeOrigin::ExtractedColumn {
                table: base.name.clone(),
            },
        }));
    }
    Ok(out)
}

fn combine_predicates(mut predicates: Vec<Predicate>) -> Option<Predicate> {
    match predicates.len() {
        0 => None,
        1 => Some(predicates.remove(0)),
        _ => Some(Predicate::Custom(Arc::new(move |config| {
            predicates.iter().all(|p| p.evaluate(config))
        }))),
    }
}

/// Substitutes `{output_name}` and each `{param}` binding into a doc
/// template. Unknown placeholders are left untouched.
fn format_doc(template: &str, output_name: &str, bindings: &[(String, String)]) -> String {
    let mut doc = template.replace("{output_name}", output_name);
    for (param, upstream) in bindings {
        doc = doc.replace(&format!("{{{param}}}"), upstream);
    }
    doc
}

/// Variant declarations share an output name: `signups__v2` publishes as
/// `signups`. Only the portion before the last `__` is kept.
fn strip_variant_suffix(name: &str) -> &str {
    match name.rsplit_once("__") {
        Some((stem, _)) => stem,
        None => name,
    }
}

fn validate_tag_key(function: &str, key: &str) -> Result<(), BuildError> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(BuildError::Configuration {
            function: function.to_string(),
            message: format!("malformed tag key '{key}'"),
        });
    }
    Ok(())
}
