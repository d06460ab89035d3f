use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Tickets
        .route("/statuses", get(handlers::statuses))
        .route("/tickets", get(tickets::search_tickets))
        .route("/tickets/export", get(tickets::export_tickets))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
