//! Range checks over scalars and series.

use crate::frame::{Value, ValueKind};
use crate::validation::{CheckResult, DataValidator};
use std::sync::Arc;

/// Inclusive range check. For a series, every entry must fall inside the
/// range; undefined (NaN) entries count as outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValidator {
    lower: f64,
    upper: f64,
}

impl RangeValidator {
    pub fn new(lower: f64, upper: f64) -> Self {
        RangeValidator { lower, upper }
    }

    fn check_scalar(&self, v: f64) -> CheckResult {
        let passes = v >= self.lower && v <= self.upper;
        CheckResult {
            passes,
            message: format!(
                "value {v} {} range [{}, {}]",
                if passes { "within" } else { "outside" },
                self.lower,
                self.upper
            ),
            diagnostics: vec![("value".to_string(), v.to_string())],
        }
    }

    fn check_series(&self, values: &[f64]) -> CheckResult {
        let in_range = values
            .iter()
            .filter(|v| **v >= self.lower && **v <= self.upper)
            .count();
        let out_range = values.len() - in_range;
        CheckResult {
            passes: out_range == 0,
            message: format!(
                "series has {in_range} values in range [{}, {}] and {out_range} outside",
                self.lower, self.upper
            ),
            diagnostics: vec![
                ("in_range".to_string(), in_range.to_string()),
                ("out_range".to_string(), out_range.to_string()),
                ("data_size".to_string(), values.len().to_string()),
            ],
        }
    }
}

impl DataValidator for RangeValidator {
    fn name(&self) -> &'static str {
        "range_validator"
    }

    fn description(&self) -> String {
        format!("values within [{}, {}]", self.lower, self.upper)
    }

    fn applies_to(&self, kind: ValueKind) -> bool {
        matches!(kind, ValueKind::Int | ValueKind::Float | ValueKind::Series)
    }

    fn validate(&self, value: &Value) -> CheckResult {
        match value {
            Value::Int(v) => self.check_scalar(*v as f64),
            Value::Float(v) => self.check_scalar(*v),
            Value::Series(s) => self.check_series(s.values()),
            other => CheckResult::fail(format!("range check cannot run on {}", other.kind())),
        }
    }
}

/// Checks that the mean of a series (ignoring undefined entries) falls in
/// an inclusive range.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanInRangeValidator {
    lower: f64,
    upper: f64,
}

impl MeanInRangeValidator {
    pub fn new(lower: f64, upper: f64) -> Self {
        MeanInRangeValidator { lower, upper }
    }
}

impl DataValidator for MeanInRangeValidator {
    fn name(&self) -> &'static str {
        "mean_in_range_validator"
    }

    fn description(&self) -> String {
        format!("series mean within [{}, {}]", self.lower, self.upper)
    }

    fn applies_to(&self, kind: ValueKind) -> bool {
        kind == ValueKind::Series
    }

    fn validate(&self, value: &Value) -> CheckResult {
        let Value::Series(s) = value else {
            return CheckResult::fail(format!("mean check cannot run on {}", value.kind()));
        };
        let defined: Vec<f64> = s.iter().filter(|v| !v.is_nan()).collect();
        if defined.is_empty() {
            return CheckResult::fail("series has no defined entries to average".to_string());
        }
        let mean = defined.iter().sum::<f64>() / defined.len() as f64;
        let passes = mean >= self.lower && mean <= self.upper;
        CheckResult {
            passes,
            message: format!(
                "series mean {mean} {} range [{}, {}]",
                if passes { "within" } else { "outside" },
                self.lower,
                self.upper
            ),
            diagnostics: vec![("mean".to_string(), mean.to_string())],
        }
    }
}

pub fn range(lower: f64, upper: f64) -> Arc<dyn DataValidator> {
    Arc::new(RangeValidator::new(lower, upper))
}

pub fn mean_in_range(lower: f64, upper: f64) -> Arc<dyn DataValidator> {
    Arc::new(MeanInRangeValidator::new(lower, upper))
}
