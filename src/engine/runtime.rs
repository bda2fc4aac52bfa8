// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::dag::Graph;
use crate::errors::Result;
use crate::store::SnapshotStore;

use super::core::CoreRuntime;
use super::handle::GraphHandle;
use super::{Envelope, Request, Response};

/// Capacity of the request channel between handles and the runtime.
const REQUEST_BUFFER: usize = 64;

/// Serialises every request for one instance through a single task.
///
/// This is a pure IO shell around `CoreRuntime`: it reads requests from a
/// channel, lets the core answer them, persists snapshots and publishes the
/// all-done flag.
pub struct Runtime {
    core: CoreRuntime,
    request_rx: mpsc::Receiver<Envelope>,
    store: Option<Box<dyn SnapshotStore>>,
    done_tx: watch::Sender<bool>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Start a runtime on the current Tokio runtime.
    ///
    /// Returns a handle for sending requests and the join handle of the
    /// runtime task, which yields the final graph once every handle has been
    /// dropped.
    pub fn spawn(
        core: CoreRuntime,
        store: Option<Box<dyn SnapshotStore>>,
    ) -> (GraphHandle, JoinHandle<Graph>) {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (done_tx, done_rx) = watch::channel(core.graph().all_done());

        let runtime = Self {
            core,
            request_rx,
            store,
            done_tx,
        };
        let join = tokio::spawn(runtime.run());

        (GraphHandle::new(request_tx, done_rx), join)
    }

    /// Main request loop.
    ///
    /// Requests are handled strictly one at a time, in arrival order.
    pub async fn run(mut self) -> Graph {
        info!(instance = %self.core.instance(), "graph runtime started");

        while let Some(Envelope { request, reply }) = self.request_rx.recv().await {
            debug!(?request, "runtime received request");

            let result = self.process(request);
            if reply.send(result).is_err() {
                debug!("requester dropped before the reply was sent");
            }
        }

        info!(instance = %self.core.instance(), "request channel closed; runtime exiting");
        self.core.into_graph()
    }

    fn process(&mut self, request: Request) -> Result<Response> {
        let mutating = matches!(request, Request::Complete(_));
        let response = self.core.handle(request)?;

        if mutating {
            let persisted = self.persist();
            self.done_tx.send_replace(self.core.graph().all_done());
            persisted?;
        }

        Ok(response)
    }

    fn persist(&mut self) -> Result<()> {
        let Some(store) = self.store.as_mut() else {
            return Ok(());
        };

        let instance = self.core.instance();
        store
            .save(instance, &self.core.stored_instance())
            .inspect_err(|err| error!(instance = %instance, %err, "failed to persist snapshot"))
    }
}
