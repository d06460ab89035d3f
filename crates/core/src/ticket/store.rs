//! Ticket source trait and types.

use thiserror::Error;

use super::{FilterClause, TicketRow};

/// Error type for ticket queries.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The ticket database could not be opened.
    #[error("Cannot open ticket database {path}: {reason}")]
    Open { path: String, reason: String },

    /// A count or fetch against the store failed.
    #[error("Query failed: {0}")]
    Database(String),

    /// The background task running a query died before reporting.
    #[error("Search worker failed: {0}")]
    Worker(String),

    /// A row visitor stopped the scan.
    #[error("Row visitor aborted the scan")]
    Aborted,
}

impl From<rusqlite::Error> for TicketError {
    fn from(e: rusqlite::Error) -> Self {
        TicketError::Database(e.to_string())
    }
}

/// Offset/limit window over an ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Everything a single page render needs, read from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    /// Rows inside the window, newest first.
    pub rows: Vec<TicketRow>,
    /// Rows matching the filter, ignoring the window.
    pub total: i64,
    /// One count per clause passed in `counts`, same order.
    pub counts: Vec<i64>,
}

/// Read-only access to a ticket table.
///
/// Every method orders rows by creation timestamp, newest first. Rows with
/// equal timestamps come back in whatever order the backend yields them.
pub trait TicketSource: Send + Sync {
    /// Count rows matching the filter.
    fn count(&self, filter: &FilterClause) -> Result<i64, TicketError>;

    /// Count, fetch one window and count each extra clause, all against one snapshot.
    fn fetch_page(
        &self,
        filter: &FilterClause,
        window: PageWindow,
        counts: &[FilterClause],
    ) -> Result<PageData, TicketError>;

    /// Hand every matching row to `visit` as it is read; returns the number of rows visited.
    ///
    /// Stops at the first visitor error and returns it.
    fn for_each_matching(
        &self,
        filter: &FilterClause,
        visit: &mut dyn FnMut(TicketRow) -> Result<(), TicketError>,
    ) -> Result<usize, TicketError>;
}
