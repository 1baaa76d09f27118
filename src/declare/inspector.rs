//! Turns a declaration into a raw node descriptor, or rejects it.

use super::function::FunctionDecl;
use super::{Decorator, NodeFn};
use crate::frame::ValueKind;
use crate::graph::error::BuildError;
use crate::graph::node::DependencyList;

/// Names starting with this prefix are helpers, never nodes.
pub(crate) const PRIVATE_PREFIX: &str = "_";

/// The raw descriptor handed to the expansion pipeline: the declaration's
/// shape with eligibility and annotation rules already applied. The body
/// may still be absent here; a creator decorator can supply it.
pub(crate) struct RawFunction {
    pub name: String,
    pub doc: String,
    pub params: DependencyList,
    pub returns: ValueKind,
    pub body: Option<NodeFn>,
    pub decorators: Vec<Decorator>,
}

impl std::fmt::Debug for RawFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFunction")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("body", &self.body.as_ref().map(|_| "<fn>"))
            .field("decorators", &format_args!("[{} decorators]", self.decorators.len()))
            .finish()
    }
}

/// Inspects one declaration. `Ok(None)` means the declaration is a
/// private helper and contributes no nodes.
pub(crate) fn inspect(decl: FunctionDecl) -> Result<Option<RawFunction>, BuildError> {
    if decl.name.is_empty() {
        return Err(BuildError::Configuration {
            function: "<unnamed>".to_string(),
            message: "declaration has an empty name".to_string(),
        });
    }
    if decl.name.starts_with(PRIVATE_PREFIX) {
        return Ok(None);
    }
    let returns = decl.returns.ok_or_else(|| BuildError::Configuration {
        function: decl.name.clone(),
        message: "missing return annotation".to_string(),
    })?;
    let mut seen = std::collections::HashSet::new();
    for (param, _) in &decl.params {
        if param.is_empty() {
            return Err(BuildError::Configuration {
                function: decl.name.clone(),
                message: "parameter with an empty name".to_string(),
            });
        }
        if !seen.insert(param.as_str()) {
            return Err(BuildError::Configuration {
                function: decl.name.clone(),
                message: format!("duplicate parameter '{param}'"),
            });
        }
    }
    Ok(Some(RawFunction {
        name: decl.name,
        doc: decl.doc,
        params: decl.params.into_iter().collect(),
        returns,
        body: decl.body,
        decorators: decl.decorators,
    }))
}
