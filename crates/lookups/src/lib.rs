//! Read-through lookups for farm records.
//!
//! Workflows refer to fields, beds, crops and the like by the names people
//! type. This crate resolves those names to records:
//! - [`CacheStore`] keeps fetched collections in memory, backed by a
//!   session-scoped [`KeyValueStore`] so they survive a reload
//! - [`LookupResolver`] fetches each [`EntityKind`] once and derives
//!   name and id maps from the cached collection

pub mod cache;
pub mod entity;
pub mod error;
pub mod resolver;
pub mod storage;

pub use cache::{CacheStore, Generation};
pub use entity::EntityKind;
pub use error::{CacheError, LookupError, Result};
pub use resolver::{IdMap, LookupResolver, NameMap};
pub use storage::{InMemorySessionStore, KeyValueStore};
