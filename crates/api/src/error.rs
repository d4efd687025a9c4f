//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lookups::LookupError;
use record_store::RecordError;
use saga::SagaJournal;
use serde::Serialize;
use thiserror::Error;
use workflows::WorkflowError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// A record left behind by a failed submission.
#[derive(Debug, Serialize)]
pub struct OrphanResponse {
    pub operation: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Operation whose failure rolled the submission back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphans: Option<Vec<OrphanResponse>>,
    /// Every action and compensation of the failed run, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<SagaJournal>,
}

impl ErrorResponse {
    fn message(error: String) -> Self {
        Self {
            error,
            operation: None,
            cause: None,
            orphans: None,
            journal: None,
        }
    }
}

fn lookup_status(err: &LookupError) -> StatusCode {
    match err {
        LookupError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        LookupError::UnknownName { .. } => StatusCode::BAD_REQUEST,
        LookupError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn workflow_response(err: WorkflowError) -> (StatusCode, ErrorResponse) {
    match err {
        WorkflowError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorResponse::message(err.to_string())),
        WorkflowError::Lookup(ref lookup) => (lookup_status(lookup), ErrorResponse::message(err.to_string())),
        WorkflowError::Remote(RecordError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, ErrorResponse::message(err.to_string()))
        }
        WorkflowError::Remote(_) => (StatusCode::BAD_GATEWAY, ErrorResponse::message(err.to_string())),
        WorkflowError::Submission {
            report,
            failure,
            journal,
        } => {
            let orphans = report
                .orphans
                .iter()
                .map(|orphan| OrphanResponse {
                    operation: orphan.operation.clone(),
                    name: orphan.summary.clone(),
                })
                .collect();
            let body = ErrorResponse {
                error: report.to_string(),
                operation: Some(failure.operation().to_string()),
                cause: Some(failure.error().to_string()),
                orphans: Some(orphans),
                journal: Some(*journal),
            };
            (StatusCode::BAD_GATEWAY, body)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::message(msg)),
            ApiError::Lookup(err) => (lookup_status(&err), ErrorResponse::message(err.to_string())),
            ApiError::Workflow(err) => workflow_response(err),
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %body.error, "request failed");
        }
        (status, Json(body)).into_response()
    }
}
