//! Workflow error types.

use lookups::LookupError;
use record_store::{Record, RecordError};
use saga::{DuplicateOperation, MissingResult, RemediationReport, RunFailure, SagaJournal};
use thiserror::Error;

/// Errors raised by a single record operation inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The record service rejected the request.
    #[error(transparent)]
    Remote(#[from] RecordError),

    /// An operation depended on a result that is not in the bundle.
    #[error(transparent)]
    MissingResult(#[from] MissingResult),

    /// The run was rejected before anything was written.
    #[error(transparent)]
    Duplicate(#[from] DuplicateOperation),
}

/// A workflow run that failed and was rolled back.
pub type WorkflowFailure = RunFailure<Record, OperationError>;

/// Errors that can occur while submitting a workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The form failed validation. Nothing was fetched or written.
    #[error("Invalid form: {0}")]
    Validation(String),

    /// A name could not be resolved, or a lookup collection could not be
    /// fetched. Nothing was written.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A record needed before writing could not be fetched.
    #[error(transparent)]
    Remote(#[from] RecordError),

    /// An operation failed after writing began.
    ///
    /// `report` lists what a person has to delete by hand; it is clean when
    /// every completed operation was rolled back. `journal` records each
    /// action and compensation in the order they happened.
    #[error("{report}")]
    Submission {
        report: RemediationReport,
        #[source]
        failure: Box<WorkflowFailure>,
        journal: Box<SagaJournal>,
    },
}

impl WorkflowError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    /// Returns the remediation report of a failed submission.
    pub fn report(&self) -> Option<&RemediationReport> {
        match self {
            WorkflowError::Submission { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Returns the journal of a failed submission.
    pub fn journal(&self) -> Option<&SagaJournal> {
        match self {
            WorkflowError::Submission { journal, .. } => Some(journal),
            _ => None,
        }
    }

    /// Returns the rolled-back run of a failed submission.
    pub fn failure(&self) -> Option<&WorkflowFailure> {
        match self {
            WorkflowError::Submission { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
