//! Sequential execution with reverse-order compensation.

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use uuid::Uuid;

use crate::{DuplicateOperation, Operation, ResultBundle, RunFailure, SagaEvent, SagaJournal};

/// Saga type used by [`run_transaction`].
pub const DEFAULT_SAGA_TYPE: &str = "transaction";

/// Executes runs of [`Operation`]s as compensating transactions.
///
/// Operations run strictly one at a time in list order. When an action
/// fails, no later operation runs; every operation that already succeeded
/// is compensated, latest first. A failed compensation is logged and leaves
/// its result in place, and the sweep carries on with the rest.
#[derive(Debug, Clone)]
pub struct SagaRunner {
    saga_type: String,
}

impl Default for SagaRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SAGA_TYPE)
    }
}

impl SagaRunner {
    /// Creates a runner that labels its runs with `saga_type`.
    pub fn new(saga_type: impl Into<String>) -> Self {
        Self {
            saga_type: saga_type.into(),
        }
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    /// Runs `operations` and returns every result, or the rolled-back failure.
    ///
    /// If two operations share a name nothing runs, and the failure names
    /// the second of them with a [`DuplicateOperation`] error.
    pub async fn run<T, E>(
        &self,
        operations: Vec<Operation<T, E>>,
    ) -> Result<ResultBundle<T>, RunFailure<T, E>>
    where
        E: fmt::Display + From<DuplicateOperation>,
    {
        self.run_with_journal(operations).await.0
    }

    /// Runs `operations` and also returns the journal of the run.
    ///
    /// A run rejected for duplicate names leaves the journal empty.
    #[tracing::instrument(
        skip(self, operations),
        fields(saga_type = %self.saga_type, operations = operations.len())
    )]
    pub async fn run_with_journal<T, E>(
        &self,
        operations: Vec<Operation<T, E>>,
    ) -> (Result<ResultBundle<T>, RunFailure<T, E>>, SagaJournal)
    where
        E: fmt::Display + From<DuplicateOperation>,
    {
        if let Some(name) = duplicate_name(&operations) {
            tracing::error!(operation = name, "duplicate operation name, nothing run");
            let error = E::from(DuplicateOperation::new(name));
            return (
                Err(RunFailure::new(name, error, ResultBundle::new())),
                SagaJournal::default(),
            );
        }

        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let mut journal = SagaJournal::default();
        journal.record(SagaEvent::run_started(
            Uuid::new_v4(),
            self.saga_type.as_str(),
            operations.len(),
        ));

        let mut results = ResultBundle::new();
        let mut completed: Vec<&Operation<T, E>> = Vec::with_capacity(operations.len());

        for operation in &operations {
            let step = operation.name();
            tracing::debug!(step, "saga step started");
            journal.record(SagaEvent::action_started(step));

            let outcome = operation.act(&results).await;
            match outcome {
                Ok(value) => {
                    results.record(step, value);
                    completed.push(operation);
                    journal.record(SagaEvent::action_completed(step));
                }
                Err(error) => {
                    tracing::warn!(step, error = %error, "saga step failed");
                    journal.record(SagaEvent::action_failed(step, error.to_string()));

                    compensate(&completed, &mut results, &mut journal, step).await;

                    let orphaned = results.live().count();
                    journal.record(SagaEvent::run_failed(step, error.to_string(), orphaned));
                    metrics::counter!("saga_failed").increment(1);
                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    tracing::info!(step, orphaned, "saga failed");

                    return (Err(RunFailure::new(step, error, results)), journal);
                }
            }
        }

        journal.record(SagaEvent::run_completed());
        metrics::counter!("saga_completed").increment(1);
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        tracing::info!(steps = results.len(), "saga completed");

        (Ok(results), journal)
    }
}

/// Undoes `completed` operations in reverse order without stopping on errors.
async fn compensate<T, E>(
    completed: &[&Operation<T, E>],
    results: &mut ResultBundle<T>,
    journal: &mut SagaJournal,
    from_step: &str,
) where
    E: fmt::Display,
{
    tracing::info!(from_step, pending = completed.len(), "compensation started");
    journal.record(SagaEvent::rollback_started(from_step, completed.len()));

    for operation in completed.iter().rev() {
        let step = operation.name();
        let outcome = operation.undo(results).await;
        match outcome {
            Ok(()) => {
                results.mark_cleaned_up(step);
                journal.record(SagaEvent::compensated(step));
            }
            Err(error) => {
                metrics::counter!("saga_compensation_failures_total").increment(1);
                tracing::warn!(step, error = %error, "compensation failed, result orphaned");
                journal.record(SagaEvent::compensation_failed(step, error.to_string()));
            }
        }
    }
}

fn duplicate_name<T, E>(operations: &[Operation<T, E>]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(operations.len());
    operations
        .iter()
        .map(Operation::name)
        .find(|name| !seen.insert(*name))
}

/// Runs `operations` with a default [`SagaRunner`].
pub async fn run_transaction<T, E>(
    operations: Vec<Operation<T, E>>,
) -> Result<ResultBundle<T>, RunFailure<T, E>>
where
    E: fmt::Display + From<DuplicateOperation>,
{
    SagaRunner::default().run(operations).await
}
