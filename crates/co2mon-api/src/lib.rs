//! co2mon-api — HTTP scrape surface.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition of every bound sensor |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use co2mon_metrics::BindingSet;

/// Fixed scrape path.
pub const METRICS_PATH: &str = "/metrics";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub bindings: Arc<BindingSet>,
}

/// Build the scrape router over the shared binding set.
pub fn build_router(bindings: Arc<BindingSet>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(handlers::prometheus_metrics))
        .with_state(ApiState { bindings })
}
