//! Post-execution output checks.
//!
//! A node may carry one or more [`DataValidator`]s attached through the
//! `check_output` decorator. They run in declared order immediately after
//! the node's value is computed, before the value is memoized or exposed
//! to dependents.

pub mod rules;
pub mod validator;

pub(crate) use validator::run_checks;

use crate::frame::{Value, ValueKind};
use std::fmt;
use std::sync::Arc;

/// How a failing check is acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    /// Log the failure and continue.
    Warn,
    /// Abort the whole execute call.
    Fail,
}

/// Outcome of one validator run: pass/fail plus a diagnostic message and
/// free-form key/value diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub passes: bool,
    pub message: String,
    pub diagnostics: Vec<(String, String)>,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        CheckResult {
            passes: true,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        CheckResult {
            passes: false,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.diagnostics.push((key.into(), value.to_string()));
        self
    }
}

/// A data-quality check over one node's output value.
pub trait DataValidator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Human-readable description, able to reference constructor state,
    /// e.g. "values within [0, 100]".
    fn description(&self) -> String;

    /// Whether this validator can run against the given value kind.
    fn applies_to(&self, kind: ValueKind) -> bool;

    fn validate(&self, value: &Value) -> CheckResult;
}

/// A validator with its configured importance, as attached to a node.
#[derive(Clone)]
pub struct OutputCheck {
    pub importance: Importance,
    pub validator: Arc<dyn DataValidator>,
}

impl fmt::Debug for OutputCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputCheck")
            .field("importance", &self.importance)
            .field("validator", &self.validator.name())
            .finish()
    }
}
