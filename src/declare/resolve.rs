//! Config resolution: gates variant nodes before graph assembly.

use super::expand::NodeTemplate;
use crate::config::Config;
use crate::graph::error::BuildError;
use std::collections::BTreeMap;

/// Evaluates each template's predicate exactly once against the fixed
/// configuration and drops the non-matching variants.
///
/// Among variants sharing one output name, at most one predicate may
/// match; two simultaneous matches are [`BuildError::AmbiguousNode`].
/// Zero matches is deliberately not an error: the name is simply absent
/// from the graph, and consumers fail lazily at execution time.
pub(crate) fn resolve_variants(
    templates: Vec<NodeTemplate>,
    config: &Config,
) -> Result<Vec<NodeTemplate>, BuildError> {
    let outcomes: Vec<Option<bool>> = templates
        .iter()
        .map(|t| t.predicate.as_ref().map(|p| p.evaluate(config)))
        .collect();

    let mut matched: BTreeMap<&str, usize> = BTreeMap::new();
    for (template, outcome) in templates.iter().zip(&outcomes) {
        if *outcome == Some(true) {
            *matched.entry(template.name.as_str()).or_insert(0) += 1;
        }
    }
    if let Some((name, count)) = matched.into_iter().find(|(_, count)| *count >= 2) {
        return Err(BuildError::AmbiguousNode {
            name: name.to_string(),
            matched: count,
        });
    }

    Ok(templates
        .into_iter()
        .zip(outcomes)
        .filter_map(|(template, outcome)| {
            if outcome == Some(false) {
                log::debug!(
                    "dropping variant '{}' from '{}': predicate did not match",
                    template.name,
                    template.module
                );
                None
            } else {
                Some(template)
            }
        })
        .collect())
}
