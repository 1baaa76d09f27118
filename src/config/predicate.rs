//! Boolean predicates over the full configuration, controlling whether a
//! node variant is included in the graph.

use super::{Config, ConfigValue};
use std::fmt;
use std::sync::Arc;

/// A condition evaluated exactly once per variant at graph construction.
///
/// The four structured variants cover the common cases; `Custom` is the
/// escape hatch for arbitrary functions of the configuration.
#[derive(Clone)]
pub enum Predicate {
    /// True when every key equals its expected value. A missing key never
    /// matches.
    Equals(Vec<(String, ConfigValue)>),
    /// True when no key equals its listed value. A missing key counts as
    /// not-equal.
    NotEquals(Vec<(String, ConfigValue)>),
    /// True when every key's value appears in its candidate list.
    In(Vec<(String, Vec<ConfigValue>)>),
    /// True when no key's value appears in its candidate list.
    NotIn(Vec<(String, Vec<ConfigValue>)>),
    Custom(Arc<dyn Fn(&Config) -> bool + Send + Sync>),
}

impl Predicate {
    pub fn when<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Predicate::Equals(collect_pairs(pairs))
    }

    pub fn when_not<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Predicate::NotEquals(collect_pairs(pairs))
    }

    pub fn when_in<K, V>(pairs: impl IntoIterator<Item = (K, Vec<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Predicate::In(collect_group_pairs(pairs))
    }

    pub fn when_not_in<K, V>(pairs: impl IntoIterator<Item = (K, Vec<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Predicate::NotIn(collect_group_pairs(pairs))
    }

    pub fn custom(f: impl Fn(&Config) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, config: &Config) -> bool {
        match self {
            Predicate::Equals(pairs) => pairs
                .iter()
                .all(|(key, expected)| config.get(key) == Some(expected)),
            Predicate::NotEquals(pairs) => pairs
                .iter()
                .all(|(key, expected)| config.get(key) != Some(expected)),
            Predicate::In(pairs) => pairs.iter().all(|(key, candidates)| {
                config
                    .get(key)
                    .map_or(false, |actual| candidates.contains(actual))
            }),
            Predicate::NotIn(pairs) => pairs.iter().all(|(key, candidates)| {
                config
                    .get(key)
                    .map_or(true, |actual| !candidates.contains(actual))
            }),
            Predicate::Custom(f) => f(config),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(pairs) => f.debug_tuple("Equals").field(pairs).finish(),
            Predicate::NotEquals(pairs) => f.debug_tuple("NotEquals").field(pairs).finish(),
            Predicate::In(pairs) => f.debug_tuple("In").field(pairs).finish(),
            Predicate::NotIn(pairs) => f.debug_tuple("NotIn").field(pairs).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn collect_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Vec<(String, ConfigValue)>
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn collect_group_pairs<K, V>(
    pairs: impl IntoIterator<Item = (K, Vec<V>)>,
) -> Vec<(String, Vec<ConfigValue>)>
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    pairs
        .into_iter()
        .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
        .collect()
}
