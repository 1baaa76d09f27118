//! Builder-style function declarations and the modules that group them.

use super::{Decorator, NodeFn};
use crate::frame::{Arguments, NodeError, Value, ValueKind};
use std::sync::Arc;

/// One declared function: the unit the expansion pipeline consumes.
///
/// The builder enforces nothing by itself; eligibility and annotation
/// rules are applied by the inspector at graph construction, so a
/// half-built declaration is representable but never becomes a node.
#[derive(Clone)]
pub struct FunctionDecl {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) params: Vec<(String, ValueKind)>,
    pub(crate) returns: Option<ValueKind>,
    pub(crate) body: Option<NodeFn>,
    pub(crate) decorators: Vec<Decorator>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionDecl {
            name: name.into(),
            doc: String::new(),
            params: Vec::new(),
            returns: None,
            body: None,
            decorators: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Declares the next parameter. Parameter order is dependency
    /// resolution order.
    pub fn param(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.params.push((name.into(), kind));
        self
    }

    pub fn returns(mut self, kind: ValueKind) -> Self {
        self.returns = Some(kind);
        self
    }

    pub fn body(
        mut self,
        f: impl Fn(&Arguments) -> Result<Value, NodeError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(f));
        self
    }

    /// Stacks a decorator. The first `with` is the innermost decorator.
    pub fn with(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FunctionDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("has_body", &self.body.is_some())
            .field("decorators", &self.decorators)
            .finish()
    }
}

/// An ordered, named collection of function declarations: the explicit
/// replacement for ambient module scanning. Modules are scanned exactly
/// once, in the order they are passed to `build`.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) functions: Vec<FunctionDecl>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn declare(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_in_order() {
        let decl = FunctionDecl::new("spend_per_signup")
            .doc("Spend per signup.")
            .param("spend", ValueKind::Series)
            .param("signups", ValueKind::Series)
            .returns(ValueKind::Series)
            .body(|args| Ok(args.get("spend")?.clone()));
        assert_eq!(decl.name(), "spend_per_signup");
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.params[0].0, "spend");
        assert!(decl.body.is_some());
    }

    #[test]
    fn test_module_keeps_declaration_order() {
        let module = Module::new("marketing")
            .declare(FunctionDecl::new("b"))
            .declare(FunctionDecl::new("a"));
        let names: Vec<&str> = module.functions.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
