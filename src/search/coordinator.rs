//! Keeps only the response to the most recent search.
//!
//! Every submission gets a fresh generation number. A settlement is applied
//! only when it carries the current generation; anything else is dropped.

use futures::future::{AbortHandle, AbortRegistration};
use tracing::{debug, warn};

use super::backend::SearchError;
use crate::query::{SearchQuery, SearchResult};

/// Receives failures that should be shown to the user.
pub trait ErrorReporter {
    fn report(&mut self, error: &SearchError);
}

impl<F> ErrorReporter for F
where
    F: FnMut(&SearchError),
{
    fn report(&mut self, error: &SearchError) {
        (*self)(error)
    }
}

/// Everything the transport needs to run one request.
#[derive(Debug)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: SearchQuery,
    pub registration: AbortRegistration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Accepted,
    Superseded,
    Cancelled,
    Failed,
}

#[derive(Debug)]
struct PendingRequest {
    generation: u64,
    abort: AbortHandle,
}

pub struct SearchCoordinator {
    last_generation: u64,
    pending: Option<PendingRequest>,
    results: Vec<SearchResult>,
    is_loading: bool,
    reporter: Box<dyn ErrorReporter>,
}

impl SearchCoordinator {
    pub fn new(reporter: impl ErrorReporter + 'static) -> Self {
        Self {
            last_generation: 0,
            pending: None,
            results: Vec::new(),
            is_loading: false,
            reporter: Box::new(reporter),
        }
    }

    pub fn submit(&mut self, query: SearchQuery) -> SearchTicket {
        if let Some(previous) = self.pending.take() {
            debug!(generation = previous.generation, "aborting superseded search");
            previous.abort.abort();
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        let (abort, registration) = AbortHandle::new_pair();

        self.pending = Some(PendingRequest { generation, abort });
        self.is_loading = true;
        debug!(generation, mode = %query.search_mode, term = %query.search_term, "submitting search");

        SearchTicket {
            generation,
            query,
            registration,
        }
    }

    pub fn settle(
        &mut self,
        generation: u64,
        outcome: Result<Vec<SearchResult>, SearchError>,
    ) -> Settlement {
        if self.current_generation() != Some(generation) {
            debug!(generation, "discarding stale search response");
            return Settlement::Superseded;
        }

        match outcome {
            // Nothing will arrive for this generation any more; results stay.
            Err(e) if e.is_cancellation() => {
                debug!(generation, "search was cancelled");
                self.pending = None;
                self.is_loading = false;
                Settlement::Cancelled
            }
            Ok(results) => {
                debug!(generation, count = results.len(), "search completed");
                self.pending = None;
                self.results = results;
                self.is_loading = false;
                Settlement::Accepted
            }
            Err(e) => {
                warn!(generation, error = %e, "search failed");
                self.pending = None;
                self.is_loading = false;
                self.reporter.report(&e);
                Settlement::Failed
            }
        }
    }

    /// Cancels the in-flight request, if any.
    pub fn abort(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(generation = pending.generation, "aborting search");
            pending.abort.abort();
        }
        self.is_loading = false;
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.generation)
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}
