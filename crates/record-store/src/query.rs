use serde_json::Value;

use crate::Record;

/// Matches records whose attribute equals any of the listed values.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    pub key: String,
    pub values: Vec<Value>,
}

impl AttributeFilter {
    /// Returns true if the record's attribute is one of the filter values.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .attributes
            .get(&self.key)
            .is_some_and(|value| self.values.contains(value))
    }
}

/// Builder for collection queries against the record service.
///
/// A query always targets a single record type; attribute filters are
/// combined with AND, values within one filter with OR.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    /// Record type to fetch, e.g. `asset--land`.
    pub record_type: String,

    /// Attribute filters, all of which must match.
    pub filters: Vec<AttributeFilter>,

    /// Page size override. The service default applies when unset.
    pub page_size: Option<usize>,
}

impl RecordQuery {
    /// Creates a query for every record of a type.
    pub fn for_type(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            filters: Vec::new(),
            page_size: None,
        }
    }

    /// Requires an attribute to equal `value`.
    pub fn filter(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_any(key, [value])
    }

    /// Requires an attribute to equal one of `values`.
    pub fn filter_any<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(AttributeFilter {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Restricts results to records whose `status` is `active`.
    pub fn active(self) -> Self {
        self.filter("status", "active")
    }

    /// Sets the number of records per page.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Returns true if the record satisfies this query.
    pub fn matches(&self, record: &Record) -> bool {
        record.record_type == self.record_type && self.filters.iter().all(|f| f.matches(record))
    }
}

/// One page of a collection fetch.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<Record>,

    /// Offset of the next page, or `None` when this was the last page.
    pub next_offset: Option<usize>,
}
