//! HTTP API server for the billing service.
//!
//! Provides REST endpoints for invoice creation, listing and daily sales
//! reports, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use identity::{HttpIdentityService, IdentityService, Principal};
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// When `identity` is set every `/billing/*` route requires an admin caller.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    identity: Option<Arc<dyn IdentityService>>,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let mut billing = Router::new()
        .route(
            "/billing/invoices",
            get(routes::invoices::list).post(routes::invoices::create),
        )
        .route("/billing/invoices/{id}", get(routes::invoices::get))
        .route("/billing/report/daily", get(routes::reports::daily));
    if let Some(identity) = identity {
        billing = billing.route_layer(middleware::from_fn_with_state(
            identity,
            identity::require_admin,
        ));
    }

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(billing.with_state(state))
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
