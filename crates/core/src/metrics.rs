//! Prometheus metrics for the query layer.
//!
//! The collectors are created lazily and registered by whoever owns the
//! registry (see [`all_metrics`]).

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Queries run, by kind ("search", "export") and result ("ok", "error").
pub static QUERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tickdash_queries_total", "Total ticket queries"),
        &["kind", "result"],
    )
    .expect("valid metric definition")
});

/// Query duration in seconds, by kind.
pub static QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tickdash_query_duration_seconds",
            "Duration of ticket queries",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["kind"],
    )
    .expect("valid metric definition")
});

/// Rows written to CSV exports.
pub static EXPORTED_ROWS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tickdash_exported_rows_total", "Ticket rows written to exports")
        .expect("valid metric definition")
});

/// Searches whose result arrived after a newer search had been submitted.
pub static SUPERSEDED_SEARCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tickdash_superseded_searches_total",
        "Searches discarded because a newer search was submitted",
    )
    .expect("valid metric definition")
});

/// All core collectors, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(QUERIES_TOTAL.clone()),
        Box::new(QUERY_DURATION.clone()),
        Box::new(EXPORTED_ROWS.clone()),
        Box::new(SUPERSEDED_SEARCHES.clone()),
    ]
}
