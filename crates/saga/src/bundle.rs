//! Results accumulated during a run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::MissingResult;

/// Results of a run keyed by operation name, in execution order.
///
/// An entry of `None` means the operation's result was cleaned up by its
/// compensation. Operations that never completed have no entry at all.
/// Serializes as a JSON object with `null` for cleaned-up entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultBundle<T> {
    entries: IndexMap<String, Option<T>>,
}

impl<T> Default for ResultBundle<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> ResultBundle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live result of an operation.
    ///
    /// Returns None if the operation has not completed or was cleaned up.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    /// Returns the live result of an operation, or a [`MissingResult`] error.
    pub fn require(&self, name: &str) -> Result<&T, MissingResult> {
        self.get(name).ok_or_else(|| MissingResult::new(name))
    }

    /// Returns the raw entry: `None` if absent, `Some(None)` if cleaned up.
    pub fn entry(&self, name: &str) -> Option<Option<&T>> {
        self.entries.get(name).map(Option::as_ref)
    }

    /// Returns true if the operation completed during the run.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns true if the operation completed and was then compensated.
    pub fn is_cleaned_up(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(None))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over operation names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over every entry in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&T>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Iterates over results that are still live, in execution order.
    pub fn live(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.as_ref()?)))
    }

    /// Consumes the bundle, returning the underlying map.
    pub fn into_inner(self) -> IndexMap<String, Option<T>> {
        self.entries
    }

    pub(crate) fn record(&mut self, name: &str, value: T) {
        self.entries.insert(name.to_string(), Some(value));
    }

    pub(crate) fn mark_cleaned_up(&mut self, name: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            *entry = None;
        }
    }
}

impl<T> FromIterator<(String, Option<T>)> for ResultBundle<T> {
    fn from_iter<I: IntoIterator<Item = (String, Option<T>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle() -> ResultBundle<u32> {
        let mut bundle = ResultBundle::new();
        bundle.record("a", 1);
        bundle.record("b", 2);
        bundle.mark_cleaned_up("b");
        bundle
    }

    #[test]
    fn get_distinguishes_live_cleaned_and_absent() {
        let bundle = bundle();

        assert_eq!(bundle.get("a"), Some(&1));
        assert_eq!(bundle.get("b"), None);
        assert_eq!(bundle.entry("b"), Some(None));
        assert_eq!(bundle.entry("c"), None);
        assert!(bundle.is_cleaned_up("b"));
        assert!(!bundle.is_cleaned_up("c"));
        assert!(bundle.contains("b"));
    }

    #[test]
    fn require_reports_the_missing_name() {
        let bundle = bundle();
        assert_eq!(bundle.require("a"), Ok(&1));
        assert_eq!(
            bundle.require("b").unwrap_err().to_string(),
            "No result available for operation b"
        );
    }

    #[test]
    fn preserves_execution_order() {
        let mut bundle = ResultBundle::new();
        for name in ["z", "m", "a"] {
            bundle.record(name, 0u8);
        }
        assert_eq!(bundle.names().collect::<Vec<_>>(), vec!["z", "m", "a"]);
    }

    #[test]
    fn serializes_cleaned_up_entries_as_null() {
        let value = serde_json::to_value(bundle()).unwrap();
        assert_eq!(value, json!({ "a": 1, "b": null }));

        let text = serde_json::to_string(&bundle()).unwrap();
        assert_eq!(text, r#"{"a":1,"b":null}"#);
    }

    #[test]
    fn live_skips_cleaned_up_entries() {
        let bundle = bundle();
        let live: Vec<_> = bundle.live().collect();
        assert_eq!(live, vec![("a", &1)]);
    }
}
