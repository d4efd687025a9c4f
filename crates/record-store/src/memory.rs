use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    Record, RecordError, RecordId, RecordPage, RecordQuery, RecordRef, Result,
    service::RecordService,
};

/// Default number of records per collection page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Request kinds accepted by the record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Create,
    Get,
    Update,
    Delete,
    Fetch,
}

impl Method {
    /// Returns the HTTP verb the remote service uses for this request.
    pub fn verb(&self) -> &'static str {
        match self {
            Method::Create => "POST",
            Method::Get | Method::Fetch => "GET",
            Method::Update => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A failure the in-memory service can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Status(u16),
    Network,
}

impl From<InjectedFailure> for RecordError {
    fn from(failure: InjectedFailure) -> Self {
        match failure {
            InjectedFailure::Status(status) => RecordError::Status { status },
            InjectedFailure::Network => RecordError::Network,
        }
    }
}

/// A request observed by the in-memory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub record_type: String,
    pub id: Option<RecordId>,
    /// Name attribute of the record sent with a create or update.
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    method: Method,
    record_type: Option<String>,
    remaining_successes: usize,
    failure: InjectedFailure,
}

impl FailureRule {
    fn applies(&self, method: Method, record_type: &str) -> bool {
        self.method == method
            && self
                .record_type
                .as_deref()
                .is_none_or(|expected| expected == record_type)
    }
}

/// A location change applied to an asset by a movement log.
#[derive(Debug, Clone)]
struct Movement {
    log: RecordId,
    asset: RecordId,
    previous: Vec<RecordRef>,
}

#[derive(Debug, Default)]
struct ServiceState {
    records: IndexMap<RecordId, Record>,
    movements: Vec<Movement>,
    rules: Vec<FailureRule>,
    requests: Vec<Request>,
}

impl ServiceState {
    /// Logs a request and applies any matching failure rule.
    fn admit(&mut self, request: Request) -> Result<()> {
        let (method, record_type) = (request.method, request.record_type.clone());
        self.requests.push(request);

        let Some(rule) = self
            .rules
            .iter_mut()
            .find(|rule| rule.applies(method, &record_type))
        else {
            return Ok(());
        };

        if rule.remaining_successes > 0 {
            rule.remaining_successes -= 1;
            return Ok(());
        }

        tracing::debug!(
            method = method.verb(),
            record_type = %record_type,
            failure = ?rule.failure,
            "Injected record service failure"
        );
        Err(rule.failure.into())
    }

    /// Rejects records whose relationships point at missing records.
    fn check_relationships(&self, record: &Record) -> Result<()> {
        let dangling = record
            .relationships
            .values()
            .flatten()
            .any(|reference| !self.records.contains_key(&reference.id));
        if dangling {
            return Err(RecordError::Status { status: 422 });
        }
        Ok(())
    }

    /// Moves the assets of a movement log to the log's locations.
    fn apply_movement(&mut self, log: &Record) {
        if log.attributes.get("is_movement").and_then(Value::as_bool) != Some(true) {
            return;
        }

        let location = log.related("location").to_vec();
        for asset in log.related("asset") {
            if let Some(stored) = self.records.get_mut(&asset.id) {
                let previous = stored.related("location").to_vec();
                stored
                    .relationships
                    .insert("location".to_string(), location.clone());
                self.movements.push(Movement {
                    log: log.id,
                    asset: asset.id,
                    previous,
                });
            }
        }
    }

    /// Undoes the movements recorded for a deleted log.
    ///
    /// An asset that moved again later keeps its current location; the later
    /// movement inherits the location this one replaced.
    fn revert_movement(&mut self, log: RecordId) {
        while let Some(index) = self.movements.iter().position(|m| m.log == log) {
            let movement = self.movements.remove(index);
            let later = self.movements[index..]
                .iter_mut()
                .find(|later| later.asset == movement.asset);

            match later {
                Some(later) => later.previous = movement.previous,
                None => {
                    if let Some(asset) = self.records.get_mut(&movement.asset) {
                        asset
                            .relationships
                            .insert("location".to_string(), movement.previous);
                    }
                }
            }
        }
    }
}

/// In-memory record service for tests and the demo server.
///
/// Records are kept in insertion order. Relationships must point at existing
/// records, and a record that is still referenced cannot be deleted, so
/// out-of-order cleanup fails the same way it does against the remote service.
/// Movement logs set the `location` of the assets they reference, and deleting
/// one puts those assets back where they were.
#[derive(Debug, Clone)]
pub struct InMemoryRecordService {
    state: Arc<RwLock<ServiceState>>,
    page_size: usize,
}

impl Default for InMemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordService {
    /// Creates a new empty in-memory record service.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates a service that serves collections in pages of `page_size`.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Arc::default(),
            page_size: page_size.max(1),
        }
    }

    /// Creates a service pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let service = Self::new();
        service.insert_all(records);
        service
    }

    /// Creates a service seeded with the sample farm.
    pub fn with_sample_farm() -> Self {
        Self::with_records(crate::sample::sample_farm())
    }

    fn read(&self) -> RwLockReadGuard<'_, ServiceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ServiceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores records directly, bypassing failure injection and the request log.
    pub fn insert_all(&self, records: impl IntoIterator<Item = Record>) {
        let mut state = self.write();
        for record in records {
            state.records.insert(record.id, record);
        }
    }

    /// Makes every `method` request for `record_type` fail with `status`.
    pub fn fail_on(&self, method: Method, record_type: &str, status: u16) {
        self.fail_after(method, Some(record_type), 0, InjectedFailure::Status(status));
    }

    /// Makes `method` requests fail once `successes` matching calls succeeded.
    ///
    /// A `record_type` of `None` matches every record type. Rules stay in
    /// place until [`clear_failures`](Self::clear_failures) is called.
    pub fn fail_after(
        &self,
        method: Method,
        record_type: Option<&str>,
        successes: usize,
        failure: InjectedFailure,
    ) {
        self.write().rules.push(FailureRule {
            method,
            record_type: record_type.map(str::to_string),
            remaining_successes: successes,
            failure,
        });
    }

    /// Removes every failure rule.
    pub fn clear_failures(&self) {
        self.write().rules.clear();
    }

    /// Returns the total number of records stored.
    pub fn record_count(&self) -> usize {
        self.read().records.len()
    }

    /// Returns the number of records of one type.
    pub fn count_of_type(&self, record_type: &str) -> usize {
        self.read()
            .records
            .values()
            .filter(|record| record.record_type == record_type)
            .count()
    }

    /// Returns true if a record with the given id exists.
    pub fn contains(&self, id: RecordId) -> bool {
        self.read().records.contains_key(&id)
    }

    /// Returns the stored record with the given id.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.read().records.get(&id).cloned()
    }

    /// Returns the first record of a type with the given name.
    pub fn find_by_name(&self, record_type: &str, name: &str) -> Option<Record> {
        self.read()
            .records
            .values()
            .find(|record| record.record_type == record_type && record.name() == Some(name))
            .cloned()
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.read().requests.clone()
    }

    /// Returns the number of requests of one kind.
    pub fn request_count(&self, method: Method) -> usize {
        self.read()
            .requests
            .iter()
            .filter(|request| request.method == method)
            .count()
    }

    /// Forgets the request log.
    pub fn clear_requests(&self) {
        self.write().requests.clear();
    }
}

#[async_trait]
impl RecordService for InMemoryRecordService {
    async fn create(&self, record: Record) -> Result<Record> {
        let mut state = self.write();
        state.admit(Request {
            method: Method::Create,
            record_type: record.record_type.clone(),
            id: Some(record.id),
            name: record.name().map(str::to_string),
        })?;

        if state.records.contains_key(&record.id) {
            return Err(RecordError::Status { status: 409 });
        }
        state.check_relationships(&record)?;

        state.records.insert(record.id, record.clone());
        state.apply_movement(&record);
        Ok(record)
    }

    async fn get(&self, record_type: &str, id: RecordId) -> Result<Option<Record>> {
        let mut state = self.write();
        state.admit(Request {
            method: Method::Get,
            record_type: record_type.to_string(),
            id: Some(id),
            name: None,
        })?;

        Ok(state
            .records
            .get(&id)
            .filter(|record| record.record_type == record_type)
            .cloned())
    }

    async fn update(&self, record: Record) -> Result<Record> {
        let mut state = self.write();
        state.admit(Request {
            method: Method::Update,
            record_type: record.record_type.clone(),
            id: Some(record.id),
            name: record.name().map(str::to_string),
        })?;

        let exists = state
            .records
            .get(&record.id)
            .is_some_and(|stored| stored.record_type == record.record_type);
        if !exists {
            return Err(RecordError::Status { status: 404 });
        }
        state.check_relationships(&record)?;

        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, record_type: &str, id: RecordId) -> Result<()> {
        let mut state = self.write();
        state.admit(Request {
            method: Method::Delete,
            record_type: record_type.to_string(),
            id: Some(id),
            name: None,
        })?;

        let exists = state
            .records
            .get(&id)
            .is_some_and(|stored| stored.record_type == record_type);
        if !exists {
            return Err(RecordError::Status { status: 404 });
        }

        let referenced = state
            .records
            .values()
            .any(|other| other.id != id && other.references(id));
        if referenced {
            return Err(RecordError::Status { status: 409 });
        }

        state.records.shift_remove(&id);
        state.revert_movement(id);
        Ok(())
    }

    async fn fetch_page(&self, query: &RecordQuery, offset: usize) -> Result<RecordPage> {
        let mut state = self.write();
        state.admit(Request {
            method: Method::Fetch,
            record_type: query.record_type.clone(),
            id: None,
            name: None,
        })?;

        let page_size = query.page_size.unwrap_or(self.page_size).max(1);
        let matching: Vec<&Record> = state
            .records
            .values()
            .filter(|record| query.matches(record))
            .collect();

        let records: Vec<Record> = matching
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|record| (*record).clone())
            .collect();
        let end = offset + records.len();
        let next_offset = (end < matching.len()).then_some(end);

        Ok(RecordPage {
            records,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordServiceExt, record_type};

    fn unit(name: &str) -> Record {
        Record::new(record_type::UNIT).with_attribute("name", name)
    }

    #[tokio::test]
    async fn create_get_and_delete() {
        let service = InMemoryRecordService::new();
        let created = service.create(unit("FEET")).await.unwrap();

        let fetched = service
            .get(record_type::UNIT, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.name(), Some("FEET"));

        service.delete(record_type::UNIT, created.id).await.unwrap();
        assert!(!service.contains(created.id));
        assert_eq!(service.record_count(), 0);
    }

    #[tokio::test]
    async fn get_with_wrong_type_returns_none() {
        let service = InMemoryRecordService::with_records([unit("FEET")]);
        let id = service.find_by_name(record_type::UNIT, "FEET").unwrap().id;

        let result = service.get(record_type::PLANT_TYPE, id).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_rejects_dangling_relationship() {
        let service = InMemoryRecordService::new();
        let orphan = Record::new(record_type::LAND).with_relationship(
            "parent",
            vec![common::RecordRef::new(record_type::LAND, RecordId::new())],
        );

        let result = service.create(orphan).await;
        assert_eq!(result.unwrap_err(), RecordError::Status { status: 422 });
        assert_eq!(service.record_count(), 0);
    }

    #[tokio::test]
    async fn delete_referenced_record_conflicts() {
        let service = InMemoryRecordService::new();
        let field = service
            .create(Record::new(record_type::LAND).with_attribute("name", "ALF"))
            .await
            .unwrap();
        let bed = service
            .create(
                Record::new(record_type::LAND)
                    .with_attribute("name", "ALF-1")
                    .with_relationship("parent", vec![field.to_ref()]),
            )
            .await
            .unwrap();

        let result = service.delete(record_type::LAND, field.id).await;
        assert_eq!(result.unwrap_err(), RecordError::Status { status: 409 });

        service.delete(record_type::LAND, bed.id).await.unwrap();
        service.delete(record_type::LAND, field.id).await.unwrap();
        assert_eq!(service.record_count(), 0);
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let service = InMemoryRecordService::new();
        let result = service.delete(record_type::UNIT, RecordId::new()).await;
        assert_eq!(result.unwrap_err(), RecordError::Status { status: 404 });
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let service = InMemoryRecordService::with_records([unit("FEET")]);
        let stored = service.find_by_name(record_type::UNIT, "FEET").unwrap();

        service
            .update(stored.clone().with_attribute("name", "METERS"))
            .await
            .unwrap();

        assert_eq!(service.record(stored.id).unwrap().name(), Some("METERS"));
    }

    #[tokio::test]
    async fn injected_status_failure() {
        let service = InMemoryRecordService::new();
        service.fail_on(Method::Create, record_type::UNIT, 401);

        let err = service.create(unit("FEET")).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 401");
        assert_eq!(service.record_count(), 0);
        assert_eq!(service.request_count(Method::Create), 1);

        service.clear_failures();
        service.create(unit("FEET")).await.unwrap();
        assert_eq!(service.record_count(), 1);
    }

    #[tokio::test]
    async fn injected_failure_after_successes() {
        let service = InMemoryRecordService::new();
        service.fail_after(Method::Create, None, 2, InjectedFailure::Network);

        service.create(unit("A")).await.unwrap();
        service.create(unit("B")).await.unwrap();
        let err = service.create(unit("C")).await.unwrap_err();

        assert_eq!(err, RecordError::Network);
        assert_eq!(service.record_count(), 2);
    }

    #[tokio::test]
    async fn failure_rule_only_matches_its_record_type() {
        let service = InMemoryRecordService::new();
        service.fail_on(Method::Create, record_type::PLANT_TYPE, 500);

        assert!(service.create(unit("FEET")).await.is_ok());
    }

    #[tokio::test]
    async fn fetch_all_follows_pages() {
        let service = InMemoryRecordService::with_page_size(2);
        service.insert_all((0..5).map(|i| unit(&format!("U{i}"))));

        let page = service
            .fetch_page(&RecordQuery::for_type(record_type::UNIT), 0)
            .await
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next_offset, Some(2));

        let all = service
            .fetch_all(&RecordQuery::for_type(record_type::UNIT))
            .await
            .unwrap();
        let names: Vec<_> = all.iter().filter_map(Record::name).collect();
        assert_eq!(names, vec!["U0", "U1", "U2", "U3", "U4"]);
        assert_eq!(service.request_count(Method::Fetch), 4);
    }

    #[tokio::test]
    async fn fetch_failure_on_later_page_fails_whole_fetch() {
        let service = InMemoryRecordService::with_page_size(2);
        service.insert_all((0..5).map(|i| unit(&format!("U{i}"))));
        service.fail_after(Method::Fetch, None, 1, InjectedFailure::Status(500));

        let result = service
            .fetch_all(&RecordQuery::for_type(record_type::UNIT))
            .await;
        assert_eq!(result.unwrap_err(), RecordError::Status { status: 500 });
    }

    #[tokio::test]
    async fn stream_all_yields_every_record() {
        use futures_util::TryStreamExt;

        let service = InMemoryRecordService::with_page_size(3);
        service.insert_all((0..7).map(|i| unit(&format!("U{i}"))));

        let query = RecordQuery::for_type(record_type::UNIT);
        let records: Vec<Record> = service.stream_all(&query).try_collect().await.unwrap();
        assert_eq!(records.len(), 7);
    }

    #[tokio::test]
    async fn require_missing_record_is_not_found() {
        let service = InMemoryRecordService::new();
        let id = RecordId::new();

        let err = service.require(record_type::PLANT, id).await.unwrap_err();
        assert!(matches!(err, RecordError::NotFound { id: missing, .. } if missing == id));
    }

    fn movement(plant: &Record, location: &[&Record]) -> Record {
        Record::new(record_type::ACTIVITY_LOG)
            .with_attribute("is_movement", true)
            .with_relationship("asset", vec![plant.to_ref()])
            .with_relationship("location", location.iter().map(|r| r.to_ref()).collect())
    }

    fn land(name: &str) -> Record {
        Record::new(record_type::LAND).with_attribute("name", name)
    }

    #[tokio::test]
    async fn movement_log_sets_and_restores_asset_location() {
        let (field, bed) = (land("ALF"), land("ALF-1"));
        let plant = Record::new(record_type::PLANT);
        let service =
            InMemoryRecordService::with_records([field.clone(), bed.clone(), plant.clone()]);

        let log = service.create(movement(&plant, &[&field, &bed])).await.unwrap();
        let moved = service.record(plant.id).unwrap();
        assert_eq!(moved.related("location"), &[field.to_ref(), bed.to_ref()]);

        service.delete(record_type::ACTIVITY_LOG, log.id).await.unwrap();
        assert!(service.record(plant.id).unwrap().related("location").is_empty());
    }

    #[tokio::test]
    async fn deleting_an_earlier_movement_keeps_the_latest_location() {
        let (field, bed) = (land("ALF"), land("ALF-1"));
        let plant = Record::new(record_type::PLANT);
        let service =
            InMemoryRecordService::with_records([field.clone(), bed.clone(), plant.clone()]);

        let first = service.create(movement(&plant, &[&field, &bed])).await.unwrap();
        let second = service.create(movement(&plant, &[&field])).await.unwrap();

        service.delete(record_type::ACTIVITY_LOG, first.id).await.unwrap();
        assert_eq!(service.record(plant.id).unwrap().related("location"), &[field.to_ref()]);

        service.delete(record_type::ACTIVITY_LOG, second.id).await.unwrap();
        assert!(service.record(plant.id).unwrap().related("location").is_empty());
    }

    #[tokio::test]
    async fn non_movement_log_leaves_location_alone() {
        let field = land("ALF");
        let plant = Record::new(record_type::PLANT)
            .with_relationship("location", vec![field.to_ref()]);
        let service = InMemoryRecordService::with_records([field.clone(), plant.clone()]);

        let log = movement(&plant, &[]).with_attribute("is_movement", false);
        service.create(log).await.unwrap();
        assert_eq!(service.record(plant.id).unwrap().related("location"), &[field.to_ref()]);
    }
}
