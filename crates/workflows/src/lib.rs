//! Farm record workflows.
//!
//! Each workflow turns a submitted form into several records on the farm
//! record service. The service has no multi-record transactions, so every
//! workflow:
//! 1. validates the form and resolves the names in it through the lookups
//! 2. builds an ordered list of [`RecordOperation`]s, each pairing a create
//!    or update with the request that undoes it
//! 3. runs them through the saga runner, which rolls back completed
//!    operations in reverse order if one fails
//!
//! A failed submission comes back as [`WorkflowError::Submission`] with a
//! report of any records that could not be rolled back.

pub mod bed;
pub mod context;
pub mod error;
pub mod ops;
pub mod records;
pub mod soil_disturbance;
pub mod termination;
pub mod transplanting;
pub mod tray_seeding;
pub mod validate;

pub use bed::AddBedForm;
pub use context::{FarmContext, WorkflowKind};
pub use error::{OperationError, Result, WorkflowError, WorkflowFailure};
pub use ops::RecordOperation;
pub use soil_disturbance::{PickedPlant, SoilDisturbanceForm, SoilDisturbanceRecords};
pub use termination::TerminationPlan;
pub use transplanting::{PickedTrays, TransplantingForm};
pub use tray_seeding::TraySeedingForm;
