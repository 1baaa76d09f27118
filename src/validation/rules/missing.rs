//! Checks over undefined (NaN) entries in a series.

use crate::frame::{Value, ValueKind};
use crate::validation::{CheckResult, DataValidator};
use std::sync::Arc;

/// Fails when the fraction of undefined entries exceeds the configured
/// maximum. An empty series has fraction 0.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxFractionMissingValidator {
    max_fraction: f64,
}

impl MaxFractionMissingValidator {
    pub fn new(max_fraction: f64) -> Self {
        MaxFractionMissingValidator { max_fraction }
    }
}

impl DataValidator for MaxFractionMissingValidator {
    fn name(&self) -> &'static str {
        "max_fraction_missing_validator"
    }

    fn description(&self) -> String {
        format!(
            "at most {:.0}% of entries undefined",
            self.max_fraction * 100.0
        )
    }

    fn applies_to(&self, kind: ValueKind) -> bool {
        kind == ValueKind::Series
    }

    fn validate(&self, value: &Value) -> CheckResult {
        let Value::Series(s) = value else {
            return CheckResult::fail(format!("missing-entry check cannot run on {}", value.kind()));
        };
        let fraction = if s.is_empty() {
            0.0
        } else {
            s.undefined_count() as f64 / s.len() as f64
        };
        CheckResult {
            passes: fraction <= self.max_fraction,
            message: format!(
                "{:.1}% of entries undefined (allowed: {:.1}%)",
                fraction * 100.0,
                self.max_fraction * 100.0
            ),
            diagnostics: vec![
                ("undefined".to_string(), s.undefined_count().to_string()),
                ("data_size".to_string(), s.len().to_string()),
            ],
        }
    }
}

pub fn max_fraction_missing(max_fraction: f64) -> Arc<dyn DataValidator> {
    Arc::new(MaxFractionMissingValidator::new(max_fraction))
}

/// Shorthand: `missing_allowed(false)` forbids undefined entries entirely,
/// `missing_allowed(true)` places no bound.
pub fn missing_allowed(allowed: bool) -> Arc<dyn DataValidator> {
    max_fraction_missing(if allowed { 1.0 } else { 0.0 })
}
