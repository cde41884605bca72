use futures::future::{Abortable, Aborted};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::backend::{SearchBackend, SearchError};
use super::coordinator::{ErrorReporter, SearchCoordinator, Settlement};
use crate::query::{SearchQuery, SearchResult};

#[derive(Debug)]
pub struct SearchResponse {
    pub generation: u64,
    pub outcome: Result<Vec<SearchResult>, SearchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub generation: u64,
    pub settlement: Settlement,
}

/// Runs backend calls as tokio tasks and feeds their outcomes back to the
/// coordinator on the caller's task.
pub struct SearchRuntime<B> {
    backend: B,
    coordinator: SearchCoordinator,
    response_tx: UnboundedSender<SearchResponse>,
    response_rx: UnboundedReceiver<SearchResponse>,
}

impl<B: SearchBackend> SearchRuntime<B> {
    pub fn new(backend: B, reporter: impl ErrorReporter + 'static) -> Self {
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            coordinator: SearchCoordinator::new(reporter),
            response_tx,
            response_rx,
        }
    }

    /// Starts a search, cancelling whatever was in flight. Returns its generation.
    pub fn submit(&mut self, query: SearchQuery) -> u64 {
        let ticket = self.coordinator.submit(query);
        let generation = ticket.generation;
        let request = Abortable::new(self.backend.search(&ticket.query), ticket.registration);
        let tx = self.response_tx.clone();

        tokio::spawn(async move {
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(Aborted) => Err(SearchError::Cancelled),
            };
            // The runtime may already be gone; nobody is left to care.
            let _ = tx.send(SearchResponse {
                generation,
                outcome,
            });
        });

        generation
    }

    /// Waits for the next backend call to finish and applies it. Pends
    /// forever when nothing is in flight.
    pub async fn next_settlement(&mut self) -> Option<Settled> {
        let response = self.response_rx.recv().await?;
        Some(self.apply(response))
    }

    /// Applies a finished backend call if one is waiting.
    pub fn try_settle(&mut self) -> Option<Settled> {
        let response = self.response_rx.try_recv().ok()?;
        Some(self.apply(response))
    }

    pub fn abort(&mut self) {
        self.coordinator.abort();
    }

    pub fn coordinator(&self) -> &SearchCoordinator {
        &self.coordinator
    }

    fn apply(&mut self, response: SearchResponse) -> Settled {
        let settlement = self
            .coordinator
            .settle(response.generation, response.outcome);
        debug!(generation = response.generation, ?settlement, "applied search response");
        Settled {
            generation: response.generation,
            settlement,
        }
    }
}
