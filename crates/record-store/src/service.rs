use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::{TryStreamExt, stream};

use crate::{Record, RecordError, RecordId, RecordPage, RecordQuery, Result};

/// A stream of records spanning every page of a query.
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<Record>> + Send + 'a>>;

/// Core trait for the remote record service.
///
/// Every call is an independent request; the service offers no
/// multi-record transactions. All implementations must be thread-safe.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Creates a record and returns it as persisted.
    async fn create(&self, record: Record) -> Result<Record>;

    /// Retrieves a record by type and id.
    ///
    /// Returns None if no such record exists.
    async fn get(&self, record_type: &str, id: RecordId) -> Result<Option<Record>>;

    /// Replaces the attributes and relationships of an existing record.
    async fn update(&self, record: Record) -> Result<Record>;

    /// Deletes a record.
    async fn delete(&self, record_type: &str, id: RecordId) -> Result<()>;

    /// Fetches one page of records matching a query, starting at `offset`.
    async fn fetch_page(&self, query: &RecordQuery, offset: usize) -> Result<RecordPage>;
}

/// Extension trait providing convenience methods for record services.
#[async_trait]
pub trait RecordServiceExt: RecordService {
    /// Fetches every record matching a query, following pagination.
    async fn fetch_all(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = Some(0);
        while let Some(current) = offset {
            let page = self.fetch_page(query, current).await?;
            records.extend(page.records);
            offset = page.next_offset;
        }
        Ok(records)
    }

    /// Retrieves a record that must exist.
    async fn require(&self, record_type: &str, id: RecordId) -> Result<Record> {
        self.get(record_type, id)
            .await?
            .ok_or_else(|| RecordError::NotFound {
                record_type: record_type.to_string(),
                id,
            })
    }

    /// Streams every record matching a query, fetching pages lazily.
    fn stream_all<'a>(&'a self, query: &'a RecordQuery) -> RecordStream<'a> {
        let pages = stream::try_unfold(Some(0usize), move |offset| async move {
            let Some(offset) = offset else {
                return Ok::<_, RecordError>(None);
            };
            let page = self.fetch_page(query, offset).await?;
            let records = stream::iter(page.records.into_iter().map(Ok::<_, RecordError>));
            Ok(Some((records, page.next_offset)))
        });
        Box::pin(pages.try_flatten())
    }
}

// Blanket implementation for all RecordService implementations
impl<T: RecordService + ?Sized> RecordServiceExt for T {}
