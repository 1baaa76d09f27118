//! Errors raised while turning declarations into a graph.
//!
//! Every variant aborts construction entirely; no partially-usable graph
//! is ever returned.

use crate::frame::ValueKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Malformed declaration or decorator arguments: missing return
    /// annotation, missing body, duplicate parameters, bad tag keys.
    #[error("configuration error in '{function}': {message}")]
    Configuration { function: String, message: String },

    /// A decorator applied to a function of incompatible shape.
    #[error("decorator misapplied on '{function}': {message}")]
    DecoratorConfiguration { function: String, message: String },

    /// Two surviving nodes share an output name.
    #[error("duplicate node '{name}' (declared in '{first}' and '{second}')")]
    DuplicateNode {
        name: String,
        first: String,
        second: String,
    },

    /// Two or more config-gated variants of one output name matched the
    /// same configuration.
    #[error("ambiguous node '{name}': {matched} config variants matched simultaneously")]
    AmbiguousNode { name: String, matched: usize },

    /// A statically-known producer/consumer kind mismatch.
    #[error(
        "type mismatch: '{consumer}' expects {expected} for dependency '{dependency}', \
         but '{producer}' produces {actual}"
    )]
    TypeMismatch {
        consumer: String,
        dependency: String,
        producer: String,
        expected: ValueKind,
        actual: ValueKind,
    },
}
