//! HTTP API for farm record workflows.
//!
//! Exposes the workflows, the cached lookups and cache invalidation over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use lookups::{CacheStore, InMemorySessionStore};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use workflows::FarmContext;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: RecordService + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<R>))
        .route("/lookups/{kind}", get(routes::lookups::names::<R>))
        .route("/cache", delete(routes::lookups::clear_all::<R>))
        .route("/cache/{kind}", delete(routes::lookups::clear::<R>))
        .route("/tray-seeding", post(routes::workflows::tray_seeding::<R>))
        .route("/transplanting", post(routes::workflows::transplanting::<R>))
        .route("/soil-disturbance", post(routes::workflows::soil_disturbance::<R>))
        .route("/beds", post(routes::workflows::add_bed::<R>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `service` with a fresh lookup cache.
pub fn create_default_state<R: RecordService + 'static>(
    service: R,
    config: &Config,
) -> Arc<AppState<R>> {
    let session = Arc::new(InMemorySessionStore::new());
    let cache = Arc::new(CacheStore::with_prefix(config.cache_prefix.clone(), session));

    Arc::new(AppState {
        farm: FarmContext::new(Arc::new(service), cache),
    })
}
