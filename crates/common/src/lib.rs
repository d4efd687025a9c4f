//! Shared record model.
//!
//! Records follow the JSON:API shape used by the remote farm record service:
//! a `type`, an `id`, free-form `attributes` and typed `relationships`.

pub mod record;
pub mod types;

pub use record::{Record, RecordRef, record_type};
pub use types::RecordId;
