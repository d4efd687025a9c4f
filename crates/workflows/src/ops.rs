//! Record operations: remote writes paired with the writes that undo them.

use std::sync::Arc;

use futures_util::FutureExt;
use record_store::{Record, RecordService, RecordServiceExt};
use saga::{Operation, ResultBundle};

use crate::OperationError;

/// An operation whose result is a record held by the service.
pub type RecordOperation = Operation<Record, OperationError>;

/// Creates the record returned by `build`; compensation deletes it.
///
/// `build` sees the results of earlier operations, so records can refer to
/// records created earlier in the same run.
pub fn create_record_op<R, F>(service: Arc<R>, name: impl Into<String>, build: F) -> RecordOperation
where
    R: RecordService + 'static,
    F: Fn(&ResultBundle<Record>) -> Result<Record, OperationError> + Send + Sync + 'static,
{
    let name = name.into();
    let own_name = name.clone();
    let create_service = service.clone();

    Operation::new(
        name,
        move |results| {
            let service = create_service.clone();
            let record = build(results);
            async move { Ok::<_, OperationError>(service.create(record?).await?) }.boxed()
        },
        move |results| {
            let service = service.clone();
            let created = results
                .require(&own_name)
                .map(|record| (record.record_type.clone(), record.id));
            async move {
                let (record_type, id) = created?;
                service.delete(&record_type, id).await?;
                Ok::<_, OperationError>(())
            }
            .boxed()
        },
    )
}

/// Sets the status of an existing record; compensation restores the status
/// it had when the operation was built.
///
/// Both directions re-read the record first so changes the service made in
/// between, such as a movement changing its location, are kept.
pub fn set_status_op<R>(
    service: Arc<R>,
    name: impl Into<String>,
    record: &Record,
    status: &'static str,
) -> RecordOperation
where
    R: RecordService + 'static,
{
    let record_type = record.record_type.clone();
    let id = record.id;
    let previous = record.status().unwrap_or("active").to_string();
    let action_service = service.clone();
    let action_type = record_type.clone();

    Operation::new(
        name,
        move |_| {
            let service = action_service.clone();
            let record_type = action_type.clone();
            async move {
                let current = service.require(&record_type, id).await?;
                let updated = service.update(current.with_attribute("status", status)).await?;
                Ok::<_, OperationError>(updated)
            }
            .boxed()
        },
        move |_| {
            let service = service.clone();
            let record_type = record_type.clone();
            let previous = previous.clone();
            async move {
                let current = service.require(&record_type, id).await?;
                service.update(current.with_attribute("status", previous)).await?;
                Ok::<_, OperationError>(())
            }
            .boxed()
        },
    )
}

/// Returns the result of an earlier operation for use in a record builder.
pub fn earlier<'a>(results: &'a ResultBundle<Record>, name: &str) -> Result<&'a Record, OperationError> {
    Ok(results.require(name)?)
}

/// Returns the results of several earlier operations, in order.
pub fn all_earlier<'a, S: AsRef<str>>(
    results: &'a ResultBundle<Record>,
    names: &[S],
) -> Result<Vec<&'a Record>, OperationError> {
    names
        .iter()
        .map(|name| earlier(results, name.as_ref()))
        .collect()
}
