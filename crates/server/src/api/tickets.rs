//! Ticket API handlers.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tickdash_core::{
    export_csv_chunks, ExportError, SearchRequest, SearchResult, Ticket, TicketFilter,
    TicketStats, ALL_STATUSES, DEFAULT_EXPORT_FILE, EXPORT_CHUNK_ROWS,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for searching tickets
#[derive(Debug, Deserialize)]
pub struct SearchTicketsParams {
    /// Free text matched against description and ticket number
    pub search: Option<String>,
    /// Status selector ("All" or a status fragment)
    pub status: Option<String>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Rows per page, clamped to the configured maximum
    pub page_size: Option<u32>,
}

impl SearchTicketsParams {
    fn filter(&self) -> TicketFilter {
        TicketFilter::new(
            self.search.clone().unwrap_or_default(),
            self.status.clone().unwrap_or_else(|| ALL_STATUSES.to_string()),
        )
    }
}

/// Query parameters for exporting tickets
#[derive(Debug, Deserialize)]
pub struct ExportTicketsParams {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Response for a ticket search
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub stats: TicketStats,
    pub page: i64,
    pub page_size: u32,
    pub total_pages: i64,
}

impl From<SearchResult> for SearchTicketsResponse {
    fn from(result: SearchResult) -> Self {
        let total_pages = result.total_pages();
        Self {
            tickets: result.tickets,
            total: result.total,
            stats: result.stats,
            page: result.page,
            page_size: result.page_size,
            total_pages,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

fn internal_error(message: impl ToString) -> (StatusCode, Json<TicketErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(TicketErrorResponse {
            error: message.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Search tickets: one page plus filter-wide totals and stats
pub async fn search_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchTicketsParams>,
) -> Result<Json<SearchTicketsResponse>, impl IntoResponse> {
    let query = state.query_config();
    let page_size = params
        .page_size
        .unwrap_or(query.page_size)
        .clamp(1, query.max_page_size.max(1));
    let request = SearchRequest::new(params.filter(), params.page.unwrap_or(1), page_size);

    match state.worker().run(request).await {
        Ok(result) => Ok(Json(SearchTicketsResponse::from(result))),
        Err(e) => {
            error!("Ticket search failed: {}", e);
            Err(internal_error(e))
        }
    }
}

/// Chunks buffered between the export task and the response body.
const EXPORT_CHANNEL_CAPACITY: usize = 4;

/// Export every matching ticket as a CSV attachment.
///
/// Rows are streamed as the blocking export task produces them. A failure
/// before the first chunk is answered with a JSON 500; a later failure cuts
/// the body short.
pub async fn export_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportTicketsParams>,
) -> Response {
    let filter = TicketFilter::new(
        params.search.unwrap_or_default(),
        params.status.unwrap_or_else(|| ALL_STATUSES.to_string()),
    );
    let service = Arc::clone(state.service());
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, ExportError>>(EXPORT_CHANNEL_CAPACITY);

    let task = tokio::task::spawn_blocking(move || {
        let result = export_csv_chunks(&service, &filter, EXPORT_CHUNK_ROWS, |chunk| {
            tx.blocking_send(Ok(Bytes::from(chunk))).map_err(|_| {
                ExportError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "export response was dropped",
                ))
            })
        });

        match result {
            Ok(_) => {}
            Err(ExportError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                warn!("Ticket export abandoned by client");
            }
            Err(e) => {
                error!("Ticket export failed: {}", e);
                let _ = tx.blocking_send(Err(e));
            }
        }
    });

    let first = match rx.recv().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(e)) => return internal_error(e).into_response(),
        None => {
            let message = match task.await {
                Err(e) => e.to_string(),
                Ok(()) => "export produced no output".to_string(),
            };
            error!("Ticket export task failed: {}", message);
            return internal_error(message).into_response();
        }
    };

    let body = tokio_stream::once(Ok(first)).chain(ReceiverStream::new(rx));

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DEFAULT_EXPORT_FILE),
            ),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
