//! Compensating transactions for services without multi-record transactions.
//!
//! A run is an ordered list of [`Operation`]s. The [`SagaRunner`] executes
//! them one at a time, collecting each result into a [`ResultBundle`] that
//! later operations can read. If an operation fails, every operation that
//! already succeeded is compensated in reverse order and a [`RunFailure`]
//! reports which results were cleaned up and which were orphaned.
//!
//! ```text
//! a ──► b ──► c ✗
//!       │     │
//!       ▼     ▼
//!  undo b ──► undo a ──► RunFailure { a: None, b: None }
//! ```

pub mod bundle;
pub mod error;
pub mod events;
pub mod journal;
pub mod operation;
pub mod report;
pub mod runner;
pub mod state;

pub use bundle::ResultBundle;
pub use error::{DuplicateOperation, MissingResult, RunFailure};
pub use events::SagaEvent;
pub use journal::SagaJournal;
pub use operation::{ActionFuture, CompensateFuture, Operation};
pub use report::{OrphanedRecord, RemediationReport};
pub use runner::{SagaRunner, run_transaction};
pub use state::SagaState;
