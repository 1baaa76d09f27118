//! Minimal sequence and table containers.
//!
//! The engine only requires indexable, length-bearing semantics from these:
//! alignment of results is checked by the executor, not enforced here.
//! Undefined entries in a [`Series`] are `f64::NAN`.

pub mod args;
pub mod value;

pub use args::Arguments;
pub use value::{NodeError, Value, ValueKind};

use std::sync::Arc;

/// A column of floats with shared ownership. Cloning shares the buffer.
#[derive(Debug, Clone)]
pub struct Series(Arc<Vec<f64>>);

impl Series {
    pub fn from_values(values: Vec<f64>) -> Self {
        Series(Arc::new(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Whether the entry at `index` is undefined (NaN). Out-of-range
    /// indices are treated as undefined.
    pub fn is_undefined(&self, index: usize) -> bool {
        self.0.get(index).map_or(true, |v| v.is_nan())
    }

    /// Count of undefined (NaN) entries.
    pub fn undefined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_nan()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::from_values(values)
    }
}

// NaN-aware equality: two series are equal when their bit patterns match
// entry for entry, so an undefined entry equals an undefined entry.
impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Ordered, named columns. Column order is insertion order; replacing an
/// existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Series)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, series: impl Into<Series>) -> Self {
        self.insert(name, series);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, series: impl Into<Series>) {
        let name = name.into();
        let series = series.into();
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = series;
        } else {
            self.columns.push((name, series));
        }
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Row count of the first column. Meaningful only for aligned tables;
    /// the executor validates alignment before assembling one.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, s)| s.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.columns.iter().map(|(n, s)| (n.as_str(), s))
    }
}
