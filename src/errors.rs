// src/errors.rs

//! Crate-wide error types.
//!
//! Three fault families map onto the three places a contract can be broken:
//! - [`GraphError`]: wiring mistakes found while building the graph or
//!   selecting a sub-graph.
//! - [`FieldFault`]: a task touched the field store outside its declared
//!   capabilities.
//! - [`EngineError`]: what `Engine::execute` reports when an invocation could
//!   not produce a pass/reject answer.
//!
//! Business errors (a loader failing to fetch data) are *not* here; they
//! travel through the store as [`crate::store::LoadError`].

use thiserror::Error;

use crate::types::FieldId;

/// Configuration faults detected at graph-build or selection time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate task id '{0}'")]
    DuplicateId(String),

    #[error("task '{consumer}' consumes field '{field}' but no loader produces it")]
    UnknownField { consumer: String, field: FieldId },

    #[error("field '{field}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        field: FieldId,
        first: String,
        second: String,
    },

    #[error("filter '{filter}' declares produced field '{field}'; filters cannot produce")]
    FilterProduces { filter: String, field: FieldId },

    #[error("cycle detected in task graph involving {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("'{0}' is not a known filter")]
    UnknownFilter(String),
}

/// Capability faults raised by the field store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldFault {
    #[error("task '{task}' does not declare '{field}' in its produced fields")]
    NotProduced { task: String, field: FieldId },

    #[error("task '{task}' does not declare '{field}' in its consumed fields")]
    NotConsumed { task: String, field: FieldId },

    #[error("field '{field}' was already written in this invocation (second writer: '{task}')")]
    Duplicate { task: String, field: FieldId },

    #[error("field '{field}' read by '{task}' before it was written")]
    Missing { task: String, field: FieldId },

    #[error("field '{field}' holds a `{stored}` but '{task}' asked for `{requested}`")]
    TypeMismatch {
        task: String,
        field: FieldId,
        stored: &'static str,
        requested: &'static str,
    },

    #[error("loader '{task}' returned without writing declared field '{field}'")]
    Unwritten { task: String, field: FieldId },
}

/// Why an invocation ended without a verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("task '{node}' violated its field contract: {fault}")]
    Task { node: String, fault: FieldFault },

    #[error("invocation ended after {completed} of {expected} tasks reported")]
    Incomplete { completed: usize, expected: usize },
}

/// Top-level error used by config loading and the binary.
#[derive(Error, Debug)]
pub enum FilterdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FilterdagError>;
