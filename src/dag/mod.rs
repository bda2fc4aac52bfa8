// src/dag/mod.rs

//! Dependency-gated step graph.
//!
//! - [`graph`] holds the [`Graph`] aggregate: construction, completion and
//!   the read-only queries.
//! - [`validate`] checks id uniqueness, reference integrity and acyclicity.
//! - [`state_manager`] applies `Blocked -> Ready -> Done` transitions and
//!   propagates completions to direct dependents.
//! - [`snapshot`] converts a graph to and from ordered [`StepRecord`]s.
//! - [`step`] defines [`StepDef`] (input) and [`Step`] (owned state).
//! - [`completion`] defines the report returned by [`Graph::complete`].

pub mod completion;
pub mod graph;
pub mod snapshot;
pub(crate) mod state_manager;
pub mod step;
pub mod templates;
pub mod validate;

pub use completion::CompletionStep;
pub use graph::Graph;
pub use snapshot::StepRecord;
pub use step::{Step, StepDef};
pub use validate::validate_defs;
