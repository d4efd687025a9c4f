//! Lookup listing and cache invalidation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use lookups::EntityKind;
use record_store::RecordService;
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct LookupNamesResponse {
    pub kind: &'static str,
    pub names: Vec<String>,
}

fn parse_kind(key: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_key(key).ok_or_else(|| ApiError::NotFound(format!("Unknown lookup: {key}")))
}

/// GET /lookups/{kind}: names of every record of a lookup kind, sorted.
#[tracing::instrument(skip(state))]
pub async fn names<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(kind): Path<String>,
) -> Result<Json<LookupNamesResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let names = state.farm.lookups().name_map(kind).await?.into_keys().collect();

    Ok(Json(LookupNamesResponse {
        kind: kind.cache_key(),
        names,
    }))
}

/// DELETE /cache: evicts every cached lookup.
pub async fn clear_all<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> StatusCode {
    state.farm.lookups().clear_all();
    tracing::info!("Cleared every cached lookup");
    StatusCode::NO_CONTENT
}

/// DELETE /cache/{kind}: evicts one cached lookup.
pub async fn clear<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(kind): Path<String>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.farm.lookups().clear(kind);
    tracing::info!(%kind, "Cleared cached lookup");
    Ok(StatusCode::NO_CONTENT)
}
