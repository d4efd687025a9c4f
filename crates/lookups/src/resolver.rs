//! Name and id lookups over cached record collections.

use std::sync::Arc;

use indexmap::IndexMap;
use record_store::{Record, RecordId, RecordRef, RecordService, RecordServiceExt};

use crate::{CacheStore, EntityKind, LookupError, Result};

/// Records keyed by name, in name order.
pub type NameMap = IndexMap<String, Record>;

/// Records keyed by id, in name order.
pub type IdMap = IndexMap<RecordId, Record>;

/// Resolves entity names and ids through the cache.
///
/// Each [`EntityKind`] is fetched from the record service at most once per
/// cache lifetime; name and id maps are both derived from that single
/// collection so they can never disagree.
pub struct LookupResolver<R> {
    service: Arc<R>,
    cache: Arc<CacheStore>,
}

impl<R> Clone for LookupResolver<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<R: RecordService> LookupResolver<R> {
    pub fn new(service: Arc<R>, cache: Arc<CacheStore>) -> Self {
        Self { service, cache }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Returns the cached collection for `kind`, fetching it on a miss.
    ///
    /// A failed fetch leaves the cache untouched so the next call retries.
    /// A fetch overtaken by a clear of the same kind hands its records to
    /// the caller without caching them.
    #[tracing::instrument(skip(self), fields(kind = kind.cache_key()))]
    pub async fn collection(&self, kind: EntityKind) -> Result<Arc<Vec<Record>>> {
        let generation = self.cache.generation(kind.cache_key());
        if let Some(records) = self.cache.get::<Vec<Record>>(kind.cache_key()) {
            return Ok(records);
        }

        let mut records = self
            .service
            .fetch_all(&kind.query())
            .await
            .map_err(|source| {
                metrics::counter!("lookup_fetch_failures_total").increment(1);
                tracing::warn!(error = %source, "Lookup fetch failed");
                LookupError::Fetch {
                    label: kind.label(),
                    source,
                }
            })?;
        records.sort_by(|a, b| a.name().cmp(&b.name()));

        tracing::debug!(count = records.len(), "Fetched lookup collection");
        Ok(self
            .cache
            .set_if_current(kind.cache_key(), generation, records)?)
    }

    /// Returns every record of `kind` keyed by name.
    pub async fn name_map(&self, kind: EntityKind) -> Result<NameMap> {
        self.name_map_where(kind, |_| true).await
    }

    /// Returns every record of `kind` keyed by id.
    pub async fn id_map(&self, kind: EntityKind) -> Result<IdMap> {
        self.id_map_where(kind, |_| true).await
    }

    async fn name_map_where(
        &self,
        kind: EntityKind,
        keep: impl Fn(&Record) -> bool,
    ) -> Result<NameMap> {
        let records = self.collection(kind).await?;
        Ok(records
            .iter()
            .filter(|record| keep(record))
            .filter_map(|record| Some((record.name()?.to_string(), record.clone())))
            .collect())
    }

    async fn id_map_where(&self, kind: EntityKind, keep: impl Fn(&Record) -> bool) -> Result<IdMap> {
        let records = self.collection(kind).await?;
        Ok(records
            .iter()
            .filter(|record| keep(record))
            .map(|record| (record.id, record.clone()))
            .collect())
    }

    /// Resolves a single name of `kind` to its record.
    pub async fn resolve(&self, kind: EntityKind, name: &str) -> Result<Record> {
        let records = self.collection(kind).await?;
        find_named(&records, kind, name)
    }

    /// Resolves several names of `kind`, in the order given.
    pub async fn resolve_all<S: AsRef<str>>(&self, kind: EntityKind, names: &[S]) -> Result<Vec<Record>> {
        let records = self.collection(kind).await?;
        names
            .iter()
            .map(|name| find_named(&records, kind, name.as_ref()))
            .collect()
    }

    pub async fn fields_and_beds(&self) -> Result<Arc<Vec<Record>>> {
        self.collection(EntityKind::FieldsAndBeds).await
    }

    pub async fn field_or_bed_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::FieldsAndBeds).await
    }

    pub async fn field_or_bed_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::FieldsAndBeds).await
    }

    pub async fn field_name_map(&self) -> Result<NameMap> {
        self.name_map_where(EntityKind::FieldsAndBeds, is_field).await
    }

    pub async fn field_id_map(&self) -> Result<IdMap> {
        self.id_map_where(EntityKind::FieldsAndBeds, is_field).await
    }

    pub async fn bed_name_map(&self) -> Result<NameMap> {
        self.name_map_where(EntityKind::FieldsAndBeds, is_bed).await
    }

    pub async fn bed_id_map(&self) -> Result<IdMap> {
        self.id_map_where(EntityKind::FieldsAndBeds, is_bed).await
    }

    pub async fn greenhouse_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::Greenhouses).await
    }

    pub async fn greenhouse_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::Greenhouses).await
    }

    pub async fn crop_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::Crops).await
    }

    pub async fn crop_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::Crops).await
    }

    pub async fn log_category_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::LogCategories).await
    }

    pub async fn log_category_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::LogCategories).await
    }

    pub async fn equipment_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::Equipment).await
    }

    pub async fn equipment_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::Equipment).await
    }

    pub async fn unit_name_map(&self) -> Result<NameMap> {
        self.name_map(EntityKind::Units).await
    }

    pub async fn unit_id_map(&self) -> Result<IdMap> {
        self.id_map(EntityKind::Units).await
    }

    /// Resolves field, bed or greenhouse names to record references.
    ///
    /// Fields and beds are checked before greenhouses. Order follows `names`.
    pub async fn planting_location_refs<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<RecordRef>> {
        let land = self.field_or_bed_name_map().await?;
        let greenhouses = self.greenhouse_name_map().await?;

        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                land.get(name)
                    .or_else(|| greenhouses.get(name))
                    .map(Record::to_ref)
                    .ok_or_else(|| LookupError::UnknownName {
                        label: "planting location",
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    /// Resolves log category names to record references.
    pub async fn log_category_refs<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<RecordRef>> {
        let categories = self.log_category_name_map().await?;
        names
            .iter()
            .map(|name| {
                categories
                    .get(name.as_ref())
                    .map(Record::to_ref)
                    .ok_or_else(|| LookupError::UnknownName {
                        label: EntityKind::LogCategories.label(),
                        name: name.as_ref().to_string(),
                    })
            })
            .collect()
    }

    /// Returns the beds whose parent is the named field or greenhouse.
    pub async fn beds_in(&self, location: &str) -> Result<Vec<Record>> {
        let parent = self.planting_location_refs(&[location]).await?.remove(0);
        let land = self.fields_and_beds().await?;
        Ok(land
            .iter()
            .filter(|record| is_bed(record))
            .filter(|record| record.related("parent").iter().any(|p| p.id == parent.id))
            .cloned()
            .collect())
    }

    /// Evicts one cached collection.
    pub fn clear(&self, kind: EntityKind) {
        self.cache.clear(kind.cache_key());
    }

    pub fn clear_fields_and_beds(&self) {
        self.clear(EntityKind::FieldsAndBeds);
    }

    pub fn clear_greenhouses(&self) {
        self.clear(EntityKind::Greenhouses);
    }

    pub fn clear_crops(&self) {
        self.clear(EntityKind::Crops);
    }

    pub fn clear_log_categories(&self) {
        self.clear(EntityKind::LogCategories);
    }

    pub fn clear_equipment(&self) {
        self.clear(EntityKind::Equipment);
    }

    pub fn clear_units(&self) {
        self.clear(EntityKind::Units);
    }

    /// Evicts every cached collection.
    pub fn clear_all(&self) {
        self.cache.clear_all();
    }
}

fn find_named(records: &[Record], kind: EntityKind, name: &str) -> Result<Record> {
    records
        .iter()
        .find(|record| record.name() == Some(name))
        .cloned()
        .ok_or_else(|| LookupError::UnknownName {
            label: kind.label(),
            name: name.to_string(),
        })
}

fn is_field(record: &Record) -> bool {
    record.attribute_str("land_type") == Some("field")
}

fn is_bed(record: &Record) -> bool {
    record.attribute_str("land_type") == Some("bed")
}
