//! Runtime value-kind check.
//!
//! The builder's static check covers declared types; node bodies are
//! dynamic, so a body can still return a kind other than the one it
//! declared. This validator catches that at the boundary.

use crate::frame::{Value, ValueKind};
use crate::validation::{CheckResult, DataValidator};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct OutputKindValidator {
    expected: ValueKind,
}

impl OutputKindValidator {
    pub fn new(expected: ValueKind) -> Self {
        OutputKindValidator { expected }
    }
}

impl DataValidator for OutputKindValidator {
    fn name(&self) -> &'static str {
        "output_kind_validator"
    }

    fn description(&self) -> String {
        format!("output is of kind {}", self.expected)
    }

    fn applies_to(&self, _kind: ValueKind) -> bool {
        true
    }

    fn validate(&self, value: &Value) -> CheckResult {
        let actual = value.kind();
        CheckResult {
            passes: self.expected.accepts(actual),
            message: format!("output kind is {actual}, expected {}", self.expected),
            diagnostics: vec![("actual".to_string(), actual.to_string())],
        }
    }
}

pub fn output_kind(expected: ValueKind) -> Arc<dyn DataValidator> {
    Arc::new(OutputKindValidator::new(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_match() {
        let v = OutputKindValidator::new(ValueKind::Series);
        assert!(v.validate(&Value::from(vec![1.0])).passes);
        assert!(!v.validate(&Value::Float(1.0)).passes);
    }

    #[test]
    fn test_any_accepts_everything() {
        let v = OutputKindValidator::new(ValueKind::Any);
        assert!(v.validate(&Value::Float(1.0)).passes);
        assert!(v.validate(&Value::from("x")).passes);
    }
}
