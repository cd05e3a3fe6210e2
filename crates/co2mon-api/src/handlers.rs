//! Route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use co2mon_metrics::prometheus::CONTENT_TYPE;

use crate::ApiState;

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = co2mon_metrics::render_prometheus(&state.bindings);
    debug!(sensors = state.bindings.len(), bytes = body.len(), "scrape served");
    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body)
}
