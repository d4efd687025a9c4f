//! Saga state machine.

use serde::{Deserialize, Serialize};

use crate::SagaEvent;

/// The state of a saga in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    #[default]
    NotStarted,

    /// Operations are being executed.
    Running,

    /// An operation failed and completed operations are being undone.
    Compensating,

    /// Every operation succeeded (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl SagaState {
    /// Returns the state after `event`, or None if the event is not valid here.
    pub fn next(self, event: &SagaEvent) -> Option<SagaState> {
        use SagaEvent as E;
        use SagaState as S;

        match (self, event) {
            (S::NotStarted, E::RunStarted { .. }) => Some(S::Running),
            (
                S::Running,
                E::ActionStarted { .. } | E::ActionCompleted { .. } | E::ActionFailed { .. },
            ) => Some(S::Running),
            (S::Running, E::RollbackStarted { .. }) => Some(S::Compensating),
            (S::Running, E::RunCompleted { .. }) => Some(S::Completed),
            (S::Compensating, E::Compensated { .. } | E::CompensationFailed { .. }) => {
                Some(S::Compensating)
            }
            (S::Compensating, E::RunFailed { .. }) => Some(S::Failed),
            _ => None,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
