//! Prometheus metrics for observability.
//!
//! The server registry holds:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Ticket counts per stats group (collected on scrape)
//! - The query layer's own metrics from `tickdash_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use tickdash_core::{TicketError, TicketFilter};
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tickdash_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tickdash_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tickdash_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Ticket Metrics (collected dynamically)
// =============================================================================

/// Tickets per stats group across the whole table.
pub static TICKETS_BY_GROUP: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("tickdash_tickets", "Current ticket count by stats group"),
        &["group"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(TICKETS_BY_GROUP.clone()),
    ];

    // Core metrics (query counts and durations, exports, superseded searches)
    for metric in collectors
        .into_iter()
        .chain(tickdash_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Refresh the ticket gauges from the database.
///
/// Called before encoding so a scrape reflects the current table. Scrapes are
/// counted as `stats` queries, never as searches. A failed query leaves the
/// previous values in place.
pub async fn collect_dynamic_metrics(state: &AppState) {
    let service = Arc::clone(state.service());
    let stats = tokio::task::spawn_blocking(move || service.stats(&TicketFilter::all()))
        .await
        .map_err(|e| TicketError::Worker(e.to_string()))
        .and_then(|result| result);

    match stats {
        Ok(stats) => {
            TICKETS_BY_GROUP.with_label_values(&["total"]).set(stats.total);
            TICKETS_BY_GROUP
                .with_label_values(&["resolved"])
                .set(stats.resolved);
            TICKETS_BY_GROUP
                .with_label_values(&["in_progress"])
                .set(stats.in_progress);
            TICKETS_BY_GROUP
                .with_label_values(&["pending"])
                .set(stats.pending);
            if let Some(cancelled) = stats.cancelled {
                TICKETS_BY_GROUP
                    .with_label_values(&["cancelled"])
                    .set(cancelled);
            }
        }
        Err(e) => warn!("Failed to collect ticket metrics: {}", e),
    }
}
