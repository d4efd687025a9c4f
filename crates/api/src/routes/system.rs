//! Health and metrics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use lookups::EntityKind;
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordService;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Lookup collections currently held in the cache.
    pub cached: Vec<&'static str>,
}

/// GET /health: reports liveness and which lookups are warm.
pub async fn health<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<HealthResponse> {
    let cache = state.farm.lookups().cache();
    let cached = EntityKind::ALL
        .into_iter()
        .filter(|kind| cache.contains(kind.cache_key()))
        .map(|kind| kind.cache_key())
        .collect();

    Json(HealthResponse {
        status: "ok",
        cached,
    })
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
