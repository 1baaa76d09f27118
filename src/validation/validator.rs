//! Runs a node's attached output checks.

use super::{CheckResult, Importance, OutputCheck};
use crate::compute::ledger::ExecutionError;
use crate::frame::Value;

/// Runs `checks` in declared order against a freshly computed value.
///
/// A failing `Warn` check is logged and skipped; the first failing `Fail`
/// check aborts with [`ExecutionError::ValidationFailure`] naming the node
/// and the validator. Passing checks are logged at debug level.
pub(crate) fn run_checks(
    node_name: &str,
    checks: &[OutputCheck],
    value: &Value,
) -> Result<(), ExecutionError> {
    for check in checks {
        let result = check.validator.validate(value);
        if result.passes {
            log::debug!(
                "node '{}': check '{}' passed: {}",
                node_name,
                check.validator.name(),
                result.message
            );
            continue;
        }
        match check.importance {
            Importance::Warn => log::warn!(
                "node '{}': check '{}' failed: {}{}",
                node_name,
                check.validator.name(),
                result.message,
                format_diagnostics(&result)
            ),
            Importance::Fail => {
                return Err(ExecutionError::ValidationFailure {
                    node: node_name.to_string(),
                    validator: check.validator.name().to_string(),
                    message: result.message,
                })
            }
        }
    }
    Ok(())
}

fn format_diagnostics(result: &CheckResult) -> String {
    if result.diagnostics.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = result
        .diagnostics
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    format!(" ({})", pairs.join(", "))
}
