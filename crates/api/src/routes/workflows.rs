//! Workflow submission endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use record_store::{Record, RecordService};
use saga::ResultBundle;
use workflows::{
    AddBedForm, SoilDisturbanceForm, SoilDisturbanceRecords, TransplantingForm, TraySeedingForm,
    WorkflowKind,
};

use super::AppState;
use crate::error::ApiError;

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

fn created<T>(kind: WorkflowKind, outcome: workflows::Result<T>) -> Created<T> {
    let label = if outcome.is_ok() { "created" } else { "failed" };
    metrics::counter!(
        "workflow_submissions_total",
        "workflow" => kind.saga_type(),
        "outcome" => label
    )
    .increment(1);

    Ok((StatusCode::CREATED, Json(outcome?)))
}

/// POST /tray-seeding
pub async fn tray_seeding<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(form): Json<TraySeedingForm>,
) -> Created<ResultBundle<Record>> {
    created(WorkflowKind::TraySeeding, state.farm.tray_seeding(&form).await)
}

/// POST /transplanting
pub async fn transplanting<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(form): Json<TransplantingForm>,
) -> Created<ResultBundle<Record>> {
    created(WorkflowKind::Transplanting, state.farm.transplanting(&form).await)
}

/// POST /soil-disturbance
pub async fn soil_disturbance<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(form): Json<SoilDisturbanceForm>,
) -> Created<SoilDisturbanceRecords> {
    created(WorkflowKind::SoilDisturbance, state.farm.soil_disturbance(&form).await)
}

/// POST /beds
pub async fn add_bed<R: RecordService + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(form): Json<AddBedForm>,
) -> Created<ResultBundle<Record>> {
    created(WorkflowKind::AddBed, state.farm.add_bed(&form).await)
}
