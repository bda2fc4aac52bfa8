// src/engine/handle.rs

use tokio::sync::{mpsc, oneshot, watch};

use crate::dag::{CompletionStep, Step, StepRecord};
use crate::errors::{Result, StepgraphError};

use super::{Envelope, InstanceSummary, Request, Response};

/// Cloneable client for a running [`Runtime`](super::Runtime).
///
/// Every call fails with [`StepgraphError::EngineClosed`] once the runtime
/// task has stopped.
#[derive(Debug, Clone)]
pub struct GraphHandle {
    request_tx: mpsc::Sender<Envelope>,
    done_rx: watch::Receiver<bool>,
}

impl GraphHandle {
    pub(crate) fn new(request_tx: mpsc::Sender<Envelope>, done_rx: watch::Receiver<bool>) -> Self {
        Self {
            request_tx,
            done_rx,
        }
    }

    pub async fn complete(&self, id: &str) -> Result<CompletionStep> {
        match self.request(Request::Complete(id.to_string())).await? {
            Response::Completed(step) => Ok(step),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_step(&self, id: &str) -> Result<Step> {
        match self.request(Request::GetStep(id.to_string())).await? {
            Response::Step(step) => Ok(step),
            other => Err(unexpected(other)),
        }
    }

    pub async fn next_ready_step(&self) -> Result<Option<Step>> {
        match self.request(Request::NextReadyStep).await? {
            Response::NextReady(step) => Ok(step),
            other => Err(unexpected(other)),
        }
    }

    pub async fn all_done(&self) -> Result<bool> {
        match self.request(Request::AllDone).await? {
            Response::AllDone(done) => Ok(done),
            other => Err(unexpected(other)),
        }
    }

    pub async fn snapshot(&self) -> Result<Vec<StepRecord>> {
        match self.request(Request::Snapshot).await? {
            Response::Snapshot(records) => Ok(records),
            other => Err(unexpected(other)),
        }
    }

    pub async fn summary(&self) -> Result<InstanceSummary> {
        match self.request(Request::Summary).await? {
            Response::Summary(summary) => Ok(summary),
            other => Err(unexpected(other)),
        }
    }

    /// Resolve once every step is `Done`.
    ///
    /// Returns immediately if the graph is already finished, including the
    /// empty graph.
    pub async fn wait_until_done(&self) -> Result<()> {
        let mut done_rx = self.done_rx.clone();
        done_rx
            .wait_for(|done| *done)
            .await
            .map_err(|_| StepgraphError::EngineClosed)?;
        Ok(())
    }

    async fn request(&self, request: Request) -> Result<Response> {
        let (reply, reply_rx) = oneshot::channel();
        self.request_tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| StepgraphError::EngineClosed)?;

        reply_rx.await.map_err(|_| StepgraphError::EngineClosed)?
    }
}

fn unexpected(response: Response) -> StepgraphError {
    StepgraphError::Other(anyhow::anyhow!(
        "engine answered with an unexpected response: {response:?}"
    ))
}
