//! Remote record service seam.
//!
//! The farm record service is only reachable through per-record CRUD calls and
//! paginated collection fetches. [`RecordService`] is the seam every workflow
//! and lookup talks to; [`InMemoryRecordService`] stands in for the remote
//! service in tests and in the demo server.

pub mod error;
pub mod memory;
pub mod query;
pub mod sample;
pub mod service;

pub use common::{Record, RecordId, RecordRef, record_type};
pub use error::{RecordError, Result};
pub use memory::{InMemoryRecordService, InjectedFailure, Method, Request};
pub use query::{AttributeFilter, RecordPage, RecordQuery};
pub use service::{RecordService, RecordServiceExt, RecordStream};
