//! Background execution of ticket searches.
//!
//! Searches run on the blocking pool so a slow database never stalls the
//! async runtime. Each submission gets a sequence number; when results come
//! back, only the most recently submitted search counts as current and older
//! ones are reported as superseded so callers can drop them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::metrics::SUPERSEDED_SEARCHES;
use crate::ticket::{SearchResult, TicketError, TicketFilter, TicketQueryService};

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub filter: TicketFilter,
    pub page: i64,
    pub page_size: u32,
}

impl SearchRequest {
    pub fn new(filter: TicketFilter, page: i64, page_size: u32) -> Self {
        Self {
            filter,
            page,
            page_size,
        }
    }
}

/// How a submitted search ended, relative to later submissions.
#[derive(Debug)]
pub enum SearchOutcome {
    /// No newer search was submitted while this one ran.
    Current(SearchResult),
    /// A newer search exists; this result is stale.
    Superseded { sequence: u64, latest: u64 },
}

impl SearchOutcome {
    pub fn is_current(&self) -> bool {
        matches!(self, SearchOutcome::Current(_))
    }

    /// The result, if it is still current.
    pub fn into_current(self) -> Option<SearchResult> {
        match self {
            SearchOutcome::Current(result) => Some(result),
            SearchOutcome::Superseded { .. } => None,
        }
    }
}

/// Runs searches off the async runtime with latest-submission-wins semantics.
#[derive(Clone)]
pub struct SearchWorker {
    service: Arc<TicketQueryService>,
    latest: Arc<AtomicU64>,
}

impl SearchWorker {
    pub fn new(service: Arc<TicketQueryService>) -> Self {
        Self {
            service,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn service(&self) -> &Arc<TicketQueryService> {
        &self.service
    }

    /// Sequence number of the most recent submission (0 before any).
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest_sequence() == sequence
    }

    /// Start a search in the background and make it the current one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: SearchRequest) -> PendingSearch {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let service = Arc::clone(&self.service);
        debug!(sequence, page = request.page, "Search submitted");

        let handle = tokio::task::spawn_blocking(move || {
            service.search(&request.filter, request.page, request.page_size)
        });

        PendingSearch {
            sequence,
            handle,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Run one search on the blocking pool without sequencing.
    pub async fn run(&self, request: SearchRequest) -> Result<SearchResult, TicketError> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || {
            service.search(&request.filter, request.page, request.page_size)
        })
        .await
        .map_err(|e| TicketError::Worker(e.to_string()))?
    }
}

/// A search started by [`SearchWorker::submit`].
pub struct PendingSearch {
    sequence: u64,
    handle: JoinHandle<Result<SearchResult, TicketError>>,
    latest: Arc<AtomicU64>,
}

impl PendingSearch {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wait for the search to finish.
    ///
    /// Query errors are returned as-is, even for a superseded search.
    pub async fn wait(self) -> Result<SearchOutcome, TicketError> {
        let result = self
            .handle
            .await
            .map_err(|e| TicketError::Worker(e.to_string()))??;

        let latest = self.latest.load(Ordering::SeqCst);
        if latest == self.sequence {
            Ok(SearchOutcome::Current(result))
        } else {
            SUPERSEDED_SEARCHES.inc();
            debug!(sequence = self.sequence, latest, "Discarding superseded search");
            Ok(SearchOutcome::Superseded {
                sequence: self.sequence,
                latest,
            })
        }
    }
}
