//! Runs backend requests off the UI loop.
//!
//! Each [`Request`] gets its own tokio task so a slow analysis never blocks a
//! decision or a chat message. Results come back as [`AppEvent::Api`]; the
//! review state decides whether they are still current.

use std::sync::Arc;

use prism_core::{execute, Request, ReviewApi};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::event::AppEvent;

pub struct ApiWorker {
    api: Arc<dyn ReviewApi>,
    event_tx: UnboundedSender<AppEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl ApiWorker {
    pub fn new(api: Arc<dyn ReviewApi>, event_tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            api,
            event_tx,
            tasks: Vec::new(),
        }
    }

    /// Spawns `request`; its response is sent back over the event channel.
    pub fn submit(&mut self, request: Request) {
        self.tasks.retain(|t| !t.is_finished());
        tracing::debug!(request = request.label(), "submitting");

        let api = Arc::clone(&self.api);
        let tx = self.event_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let response = execute(api.as_ref(), request).await;
            let _ = tx.send(AppEvent::Api(Box::new(response)));
        }));
    }

    /// Number of requests still waiting on the backend.
    pub fn in_flight(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Aborts every outstanding request.
    ///
    /// Used when the session changes; responses that already arrived are
    /// discarded as stale by the review state anyway.
    pub fn cancel_all(&mut self) {
        let pending = self.in_flight();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if pending > 0 {
            tracing::info!(pending, "cancelled outstanding requests");
        }
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
