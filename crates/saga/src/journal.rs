//! Event journal of a single saga run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{SagaEvent, SagaState};

/// Ordered record of everything that happened during one run.
///
/// Built by applying [`SagaEvent`]s in order, so a journal can be rebuilt
/// from its serialized events with [`SagaJournal::replay`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaJournal {
    saga_id: Option<Uuid>,
    saga_type: String,
    state: SagaState,
    events: Vec<SagaEvent>,
    completed_steps: Vec<String>,
    compensated_steps: Vec<String>,
    failed_compensations: Vec<String>,
    failed_step: Option<String>,
    failure_reason: Option<String>,
}

impl SagaJournal {
    /// Rebuilds a journal from previously recorded events.
    pub fn replay(events: impl IntoIterator<Item = SagaEvent>) -> Self {
        let mut journal = Self::default();
        for event in events {
            journal.record(event);
        }
        journal
    }

    /// Applies an event and appends it to the journal.
    pub fn record(&mut self, event: SagaEvent) {
        match self.state.next(&event) {
            Some(state) => self.state = state,
            None => tracing::warn!(
                state = %self.state,
                event = event.kind(),
                "Ignoring out-of-order saga event state change"
            ),
        }

        match &event {
            SagaEvent::RunStarted {
                saga_id, saga_type, ..
            } => {
                self.saga_id = Some(*saga_id);
                self.saga_type = saga_type.clone();
            }
            SagaEvent::ActionCompleted { operation } => {
                self.completed_steps.push(operation.clone());
            }
            SagaEvent::Compensated { operation } => {
                self.compensated_steps.push(operation.clone());
            }
            SagaEvent::CompensationFailed { operation, .. } => {
                self.failed_compensations.push(operation.clone());
            }
            SagaEvent::ActionFailed { operation, error }
            | SagaEvent::RunFailed {
                operation, error, ..
            } => {
                self.failed_step = Some(operation.clone());
                self.failure_reason = Some(error.clone());
            }
            SagaEvent::ActionStarted { .. }
            | SagaEvent::RollbackStarted { .. }
            | SagaEvent::RunCompleted { .. } => {}
        }

        self.events.push(event);
    }
}

// Query methods
impl SagaJournal {
    pub fn saga_id(&self) -> Option<Uuid> {
        self.saga_id
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn events(&self) -> &[SagaEvent] {
        &self.events
    }

    /// Operations whose action succeeded, in execution order.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Operations that were successfully compensated, in compensation order.
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Operations whose compensation failed, in compensation order.
    pub fn failed_compensations(&self) -> &[String] {
        &self.failed_compensations
    }

    pub fn failed_step(&self) -> Option<&str> {
        self.failed_step.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}
