// src/errors.rs

//! Crate-wide error types.
//!
//! The graph core returns one narrow error enum per operation family so that
//! callers can match exhaustively on what actually can go wrong. Host-level
//! code (config, store, engine, CLI) uses [`StepgraphError`].

use thiserror::Error;

use crate::types::{StepName, StepState};

/// Failure to build a graph from step definitions. No graph is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("duplicate step id: {0}")]
    DuplicateId(StepName),

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency {
        step: StepName,
        dependency: StepName,
    },

    #[error("cycle detected in step graph involving step '{0}'")]
    CycleDetected(StepName),
}

/// Rejected `complete` call. The graph is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("step not found: {0}")]
    NotFound(StepName),

    #[error("step '{step}' cannot be completed from state {state}")]
    InvalidTransition { step: StepName, state: StepState },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("step not found: {0}")]
    NotFound(StepName),
}

/// Structurally invalid snapshot handed to `Graph::restore`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptSnapshot {
    #[error("corrupt snapshot: duplicate step id '{0}'")]
    DuplicateId(StepName),

    #[error("corrupt snapshot: step '{step}' depends on missing step '{dependency}'")]
    DanglingDependency {
        step: StepName,
        dependency: StepName,
    },

    #[error("corrupt snapshot: step '{step}' is inconsistent: {reason}")]
    InconsistentState { step: StepName, reason: String },
}

#[derive(Error, Debug)]
pub enum StepgraphError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    CorruptSnapshot(#[from] CorruptSnapshot),

    #[error("graph engine has shut down")]
    EngineClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StepgraphError>;
