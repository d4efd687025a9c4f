use thiserror::Error;

use crate::RecordId;

/// Errors returned by the remote record service.
///
/// Status failures render exactly like the service's client library so the
/// message can be shown to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The service answered with a non-success HTTP status.
    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    /// The request never reached the service.
    #[error("Network Error")]
    Network,

    /// A record that must exist was not found.
    #[error("Record not found: {record_type} with id {id}")]
    NotFound { record_type: String, id: RecordId },

    /// A response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RecordError {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RecordError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Serialization(e.to_string())
    }
}

/// Result type for record service operations.
pub type Result<T> = std::result::Result<T, RecordError>;
