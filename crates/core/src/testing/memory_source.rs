//! In-memory ticket source for testing.

use std::sync::RwLock;
use std::time::Duration;

use crate::ticket::{FilterClause, PageData, PageWindow, TicketError, TicketRow, TicketSource};

/// Vec-backed implementation of [`TicketSource`].
///
/// Evaluates [`FilterClause`] conditions directly, so it doubles as a
/// reference for what the SQLite store must return. Provides knobs to:
/// - Fail every query with a storage error
/// - Slow every query down (to exercise background workers)
/// - Count how many page fetches were served
///
/// Rows with equal timestamps keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryTicketSource {
    rows: RwLock<Vec<TicketRow>>,
    failure: RwLock<Option<String>>,
    delay: RwLock<Option<Duration>>,
    fetches: RwLock<usize>,
}

impl MemoryTicketSource {
    pub fn new(rows: Vec<TicketRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
            ..Default::default()
        }
    }

    /// Append a row, as an external writer would.
    pub fn push(&self, row: TicketRow) {
        self.rows.write().unwrap().push(row);
    }

    /// Make every subsequent query fail with this message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().unwrap() = Some(message.into());
    }

    /// Undo [`MemoryTicketSource::fail_with`].
    pub fn recover(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// Sleep this long inside every query.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    /// Number of `fetch_page` calls served so far.
    pub fn fetch_count(&self) -> usize {
        *self.fetches.read().unwrap()
    }

    fn check(&self) -> Result<(), TicketError> {
        if let Some(delay) = *self.delay.read().unwrap() {
            std::thread::sleep(delay);
        }
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(TicketError::Database(message.clone())),
            None => Ok(()),
        }
    }

    fn matching(&self, filter: &FilterClause) -> Vec<TicketRow> {
        let mut rows: Vec<TicketRow> = self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

impl TicketSource for MemoryTicketSource {
    fn count(&self, filter: &FilterClause) -> Result<i64, TicketError> {
        self.check()?;
        Ok(self.matching(filter).len() as i64)
    }

    fn fetch_page(
        &self,
        filter: &FilterClause,
        window: PageWindow,
        counts: &[FilterClause],
    ) -> Result<PageData, TicketError> {
        *self.fetches.write().unwrap() += 1;
        self.check()?;

        let matching = self.matching(filter);
        let total = matching.len() as i64;
        let offset = usize::try_from(window.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit.max(0)).unwrap_or(usize::MAX);
        let rows = matching.into_iter().skip(offset).take(limit).collect();

        let counts = counts
            .iter()
            .map(|clause| self.matching(clause).len() as i64)
            .collect();

        Ok(PageData {
            rows,
            total,
            counts,
        })
    }

    fn for_each_matching(
        &self,
        filter: &FilterClause,
        visit: &mut dyn FnMut(TicketRow) -> Result<(), TicketError>,
    ) -> Result<usize, TicketError> {
        self.check()?;

        let mut visited = 0;
        for row in self.matching(filter) {
            visit(row)?;
            visited += 1;
        }
        Ok(visited)
    }
}
