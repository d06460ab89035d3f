//! Query service turning a filter and page number into a counted, classified page.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::StatsPolicy;
use crate::metrics::{QUERIES_TOTAL, QUERY_DURATION};

use super::{
    build_filter_clause, FilterClause, PageWindow, SearchResult, StatusGroup, Ticket,
    TicketError, TicketFilter, TicketRow, TicketSource, TicketStats,
};

/// Rows per page when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Stateless read path over a [`TicketSource`].
///
/// Every call builds its filter from scratch; nothing is cached between calls.
#[derive(Clone)]
pub struct TicketQueryService {
    source: Arc<dyn TicketSource>,
    stats_policy: StatsPolicy,
}

impl TicketQueryService {
    pub fn new(source: Arc<dyn TicketSource>) -> Self {
        Self {
            source,
            stats_policy: StatsPolicy::default(),
        }
    }

    pub fn with_stats_policy(mut self, stats_policy: StatsPolicy) -> Self {
        self.stats_policy = stats_policy;
        self
    }

    pub fn stats_policy(&self) -> StatsPolicy {
        self.stats_policy
    }

    /// Base predicate for a filter; see [`build_filter_clause`].
    pub fn build_filter_clause(filter: &TicketFilter) -> FilterClause {
        build_filter_clause(filter)
    }

    /// One page of matching tickets, newest first, with filter-wide totals and stats.
    ///
    /// `page` is 1-based; anything below 1 is served as page 1. A page past the
    /// end comes back empty.
    pub fn search(
        &self,
        filter: &TicketFilter,
        page: i64,
        page_size: u32,
    ) -> Result<SearchResult, TicketError> {
        let started = Instant::now();
        let page = page.max(1);
        let page_size = page_size.max(1);
        let window = PageWindow {
            limit: i64::from(page_size),
            offset: (page - 1).saturating_mul(i64::from(page_size)),
        };

        let (rows, stats) = self.fetch(filter, window, "search")?;
        let tickets: Vec<Ticket> = rows.into_iter().map(Ticket::from).collect();

        debug!(
            search = %filter.search,
            status = %filter.status,
            page,
            page_size,
            total = stats.total,
            returned = tickets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ticket search completed"
        );

        Ok(SearchResult {
            tickets,
            total: stats.total,
            stats,
            page,
            page_size,
        })
    }

    /// Filter-wide totals and stats only; no rows are read.
    ///
    /// Counted under the `stats` query kind rather than `search`.
    pub fn stats(&self, filter: &TicketFilter) -> Result<TicketStats, TicketError> {
        let window = PageWindow {
            limit: 0,
            offset: 0,
        };
        let (_, stats) = self.fetch(filter, window, "stats")?;
        Ok(stats)
    }

    fn fetch(
        &self,
        filter: &TicketFilter,
        window: PageWindow,
        kind: &str,
    ) -> Result<(Vec<TicketRow>, TicketStats), TicketError> {
        let started = Instant::now();
        let base = build_filter_clause(filter);
        let groups = StatusGroup::for_policy(self.stats_policy);
        let group_clauses: Vec<FilterClause> = groups
            .iter()
            .map(|group| base.clone().and(group.condition(self.stats_policy)))
            .collect();

        let data = match self.source.fetch_page(&base, window, &group_clauses) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, kind, search = %filter.search, status = %filter.status, "Ticket query failed");
                QUERIES_TOTAL.with_label_values(&[kind, "error"]).inc();
                return Err(e);
            }
        };

        let mut stats = TicketStats {
            total: data.total,
            ..Default::default()
        };
        for (group, count) in groups.iter().zip(data.counts.iter().copied()) {
            match group {
                StatusGroup::Resolved => stats.resolved = count,
                StatusGroup::InProgress => stats.in_progress = count,
                StatusGroup::Pending => stats.pending = count,
                StatusGroup::Cancelled => stats.cancelled = Some(count),
            }
        }

        QUERY_DURATION
            .with_label_values(&[kind])
            .observe(started.elapsed().as_secs_f64());
        QUERIES_TOTAL.with_label_values(&[kind, "ok"]).inc();

        Ok((data.rows, stats))
    }

    /// Every matching ticket in search order, without paging or stats.
    pub fn export_all(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let mut tickets = Vec::new();
        self.export_each(filter, |ticket| {
            tickets.push(ticket);
            Ok::<(), TicketError>(())
        })?;
        Ok(tickets)
    }

    /// Stream every matching ticket to `visit` in search order; returns the row count.
    ///
    /// The first error from `visit` stops the scan and is returned unchanged.
    pub fn export_each<F, E>(&self, filter: &TicketFilter, mut visit: F) -> Result<usize, E>
    where
        F: FnMut(Ticket) -> Result<(), E>,
        E: From<TicketError>,
    {
        let started = Instant::now();
        let base = build_filter_clause(filter);

        let mut failure: Option<E> = None;
        let result = self.source.for_each_matching(&base, &mut |row| {
            visit(Ticket::from(row)).map_err(|e| {
                failure = Some(e);
                TicketError::Aborted
            })
        });

        let outcome = match (result, failure) {
            (_, Some(e)) => Err(e),
            (Ok(count), None) => Ok(count),
            (Err(e), None) => {
                warn!(error = %e, search = %filter.search, status = %filter.status, "Ticket export failed");
                Err(E::from(e))
            }
        };

        let label = if outcome.is_ok() { "ok" } else { "error" };
        QUERIES_TOTAL.with_label_values(&["export", label]).inc();
        QUERY_DURATION
            .with_label_values(&["export"])
            .observe(started.elapsed().as_secs_f64());

        if let Ok(count) = &outcome {
            debug!(
                search = %filter.search,
                status = %filter.status,
                exported = count,
                "Ticket export completed"
            );
        }

        outcome
    }
}
