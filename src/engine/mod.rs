// src/engine/mod.rs

//! Single-writer host shell around one [`Graph`](crate::dag::Graph).
//!
//! The graph requires at most one mutation in flight. This module provides
//! that guarantee for in-process hosts:
//! - [`core`] is a synchronous, deterministic request handler that owns the
//!   graph and the instance-level bookkeeping.
//! - [`runtime`] is the async shell: it pulls requests off a channel one at a
//!   time, persists a snapshot after each accepted completion, and publishes
//!   the all-done predicate.
//! - [`handle`] is the cloneable client used to talk to a running shell.

use serde::Serialize;
use tokio::sync::oneshot;

use crate::dag::{CompletionStep, Step, StepRecord};
use crate::errors::Result;
use crate::types::{InstanceState, StepName, Timestamp};

pub mod core;
pub mod handle;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use handle::GraphHandle;
pub use runtime::Runtime;

/// Operations a host can ask of a running instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Complete(StepName),
    GetStep(StepName),
    NextReadyStep,
    AllDone,
    Snapshot,
    Summary,
}

/// Successful answer to a [`Request`], variant for variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Completed(CompletionStep),
    Step(Step),
    NextReady(Option<Step>),
    AllDone(bool),
    Snapshot(Vec<StepRecord>),
    Summary(InstanceSummary),
}

/// Instance-level view: overall state, timing, and every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub instance: String,
    pub state: InstanceState,
    pub create_time: Option<Timestamp>,
    pub update_time: Option<Timestamp>,
    pub done: usize,
    pub total: usize,
    pub steps: Vec<StepRecord>,
}

/// A request paired with the channel its answer goes back on.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) request: Request,
    pub(crate) reply: oneshot::Sender<Result<Response>>,
}
