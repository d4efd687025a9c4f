//! Saga error types.

use std::fmt;

use thiserror::Error;

use crate::ResultBundle;
use crate::report::OrphanedRecord;

/// An operation asked for a result that is not available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No result available for operation {operation}")]
pub struct MissingResult {
    pub operation: String,
}

impl MissingResult {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

/// Two operations in one run share a name, so their results would collide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Duplicate operation name {operation}")]
pub struct DuplicateOperation {
    pub operation: String,
}

impl DuplicateOperation {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl From<DuplicateOperation> for String {
    fn from(e: DuplicateOperation) -> Self {
        e.to_string()
    }
}

/// A run failed and was rolled back as far as possible.
///
/// Carries the error of the operation that failed, unchanged, and the final
/// results: entries of `None` were cleaned up, entries still holding a value
/// are orphaned and need manual cleanup. Operations after the failed one
/// never ran and have no entry.
#[derive(Debug)]
pub struct RunFailure<T, E> {
    operation: String,
    error: E,
    results: ResultBundle<T>,
}

impl<T, E> RunFailure<T, E> {
    pub(crate) fn new(operation: impl Into<String>, error: E, results: ResultBundle<T>) -> Self {
        Self {
            operation: operation.into(),
            error,
            results,
        }
    }

    /// Returns the name of the operation whose action failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the error that triggered the rollback.
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Returns the results as they stood after compensation.
    pub fn results(&self) -> &ResultBundle<T> {
        &self.results
    }

    /// Iterates over results whose compensation failed.
    pub fn orphans(&self) -> impl Iterator<Item = (&str, &T)> {
        self.results.live()
    }

    /// Returns true if any result could not be cleaned up.
    pub fn has_orphans(&self) -> bool {
        self.orphans().next().is_some()
    }

    /// Describes each orphaned result with `describe`.
    ///
    /// `describe` returns an identifying summary of the orphaned value, or
    /// `None` if it has nothing a person could search for.
    pub fn orphans_with<F>(&self, describe: F) -> Vec<OrphanedRecord>
    where
        F: Fn(&T) -> Option<String>,
    {
        self.orphans()
            .map(|(operation, value)| OrphanedRecord::new(operation, describe(value)))
            .collect()
    }

    /// Splits the failure into its parts.
    pub fn into_parts(self) -> (String, E, ResultBundle<T>) {
        (self.operation, self.error, self.results)
    }

    /// Converts the triggering error, keeping the results.
    pub fn map_err<F, E2>(self, f: F) -> RunFailure<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        RunFailure {
            operation: self.operation,
            error: f(self.error),
            results: self.results,
        }
    }
}

impl<T, E: fmt::Display> fmt::Display for RunFailure<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation {} failed: {}", self.operation, self.error)
    }
}

impl<T, E> std::error::Error for RunFailure<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("network error")]
    struct NetworkError;

    fn failure() -> RunFailure<u32, NetworkError> {
        let mut results = ResultBundle::new();
        results.record("a", 1);
        results.record("b", 2);
        results.mark_cleaned_up("b");
        RunFailure::new("c", NetworkError, results)
    }

    #[test]
    fn display_and_source_preserve_the_error() {
        let failure = failure();
        assert_eq!(failure.to_string(), "Operation c failed: network error");
        assert_eq!(failure.source().unwrap().to_string(), "network error");
        assert_eq!(failure.operation(), "c");
    }

    #[test]
    fn orphans_are_live_results() {
        let failure = failure();
        assert!(failure.has_orphans());

        let orphans = failure.orphans_with(|value| Some(format!("record {value}")));
        assert_eq!(orphans, vec![OrphanedRecord::new("a", Some("record 1".into()))]);
    }

    #[test]
    fn map_err_keeps_results() {
        let mapped = failure().map_err(|e| e.to_string());
        assert_eq!(mapped.error(), "network error");
        assert_eq!(mapped.results().len(), 2);
    }
}
