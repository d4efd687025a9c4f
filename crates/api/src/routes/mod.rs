//! HTTP route handlers.

pub mod lookups;
pub mod system;
pub mod workflows;

use ::workflows::FarmContext;

/// Shared application state accessible from all handlers.
pub struct AppState<R> {
    pub farm: FarmContext<R>,
}
