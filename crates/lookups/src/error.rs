//! Lookup error types.

use record_store::RecordError;
use thiserror::Error;

/// Errors raised by the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A value could not be encoded for the session tier.
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

/// Errors raised while resolving lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Fetching a collection from the record service failed.
    ///
    /// The message is shown to users as-is; the service error is kept as
    /// the source.
    #[error("Unable to fetch {label}.")]
    Fetch {
        label: &'static str,
        #[source]
        source: RecordError,
    },

    /// A name did not match any record of the expected kind.
    #[error("Unknown {label}: {name}")]
    UnknownName { label: &'static str, name: String },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn fetch_error_message_names_the_collection() {
        let err = LookupError::Fetch {
            label: "log categories",
            source: RecordError::Status { status: 401 },
        };
        assert_eq!(err.to_string(), "Unable to fetch log categories.");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Request failed with status code 401")
        );
    }
}
