//! Events recorded while a saga runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One thing that happened during a run, in the order it happened.
///
/// Serialized flat with a snake_case `type` tag:
///
/// ```json
/// { "type": "action_failed", "operation": "traysQuantity", "error": "Network Error" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SagaEvent {
    RunStarted {
        saga_id: Uuid,
        /// The kind of run, e.g. `tray_seeding`.
        saga_type: String,
        operations: usize,
        at: DateTime<Utc>,
    },
    ActionStarted {
        operation: String,
    },
    ActionCompleted {
        operation: String,
    },
    ActionFailed {
        operation: String,
        error: String,
    },
    /// Completed operations are about to be undone, latest first.
    RollbackStarted {
        /// The operation whose failure triggered the rollback.
        failed: String,
        pending: usize,
    },
    /// An operation's result was cleaned up.
    Compensated {
        operation: String,
    },
    /// An operation's result could not be cleaned up and is orphaned.
    CompensationFailed {
        operation: String,
        error: String,
    },
    RunCompleted {
        at: DateTime<Utc>,
    },
    /// The rollback has finished.
    RunFailed {
        operation: String,
        error: String,
        /// Results left behind by failed compensations.
        orphaned: usize,
        at: DateTime<Utc>,
    },
}

impl SagaEvent {
    pub fn run_started(saga_id: Uuid, saga_type: impl Into<String>, operations: usize) -> Self {
        SagaEvent::RunStarted {
            saga_id,
            saga_type: saga_type.into(),
            operations,
            at: Utc::now(),
        }
    }

    pub fn action_started(operation: impl Into<String>) -> Self {
        SagaEvent::ActionStarted {
            operation: operation.into(),
        }
    }

    pub fn action_completed(operation: impl Into<String>) -> Self {
        SagaEvent::ActionCompleted {
            operation: operation.into(),
        }
    }

    pub fn action_failed(operation: impl Into<String>, error: impl Into<String>) -> Self {
        SagaEvent::ActionFailed {
            operation: operation.into(),
            error: error.into(),
        }
    }

    pub fn rollback_started(failed: impl Into<String>, pending: usize) -> Self {
        SagaEvent::RollbackStarted {
            failed: failed.into(),
            pending,
        }
    }

    pub fn compensated(operation: impl Into<String>) -> Self {
        SagaEvent::Compensated {
            operation: operation.into(),
        }
    }

    pub fn compensation_failed(operation: impl Into<String>, error: impl Into<String>) -> Self {
        SagaEvent::CompensationFailed {
            operation: operation.into(),
            error: error.into(),
        }
    }

    pub fn run_completed() -> Self {
        SagaEvent::RunCompleted { at: Utc::now() }
    }

    pub fn run_failed(operation: impl Into<String>, error: impl Into<String>, orphaned: usize) -> Self {
        SagaEvent::RunFailed {
            operation: operation.into(),
            error: error.into(),
            orphaned,
            at: Utc::now(),
        }
    }

    /// Returns the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            SagaEvent::RunStarted { .. } => "run_started",
            SagaEvent::ActionStarted { .. } => "action_started",
            SagaEvent::ActionCompleted { .. } => "action_completed",
            SagaEvent::ActionFailed { .. } => "action_failed",
            SagaEvent::RollbackStarted { .. } => "rollback_started",
            SagaEvent::Compensated { .. } => "compensated",
            SagaEvent::CompensationFailed { .. } => "compensation_failed",
            SagaEvent::RunCompleted { .. } => "run_completed",
            SagaEvent::RunFailed { .. } => "run_failed",
        }
    }

    /// Returns the operation a per-operation event is about.
    ///
    /// [`SagaEvent::RunFailed`] names the failed operation too.
    pub fn operation(&self) -> Option<&str> {
        match self {
            SagaEvent::ActionStarted { operation }
            | SagaEvent::ActionCompleted { operation }
            | SagaEvent::ActionFailed { operation, .. }
            | SagaEvent::Compensated { operation }
            | SagaEvent::CompensationFailed { operation, .. }
            | SagaEvent::RunFailed { operation, .. } => Some(operation),
            SagaEvent::RollbackStarted { failed, .. } => Some(failed),
            SagaEvent::RunStarted { .. } | SagaEvent::RunCompleted { .. } => None,
        }
    }
}
