#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use lookups::CacheStore;
use record_store::{InMemoryRecordService, Record, RecordRef, record_type};
use workflows::FarmContext;

pub type Service = InMemoryRecordService;

/// A context over a fresh sample farm with an empty cache.
pub fn farm() -> (FarmContext<Service>, Arc<Service>) {
    let service = Arc::new(InMemoryRecordService::with_sample_farm());
    let ctx = FarmContext::new(service.clone(), Arc::new(CacheStore::in_memory()));
    (ctx, service)
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn land(service: &Service, name: &str) -> Record {
    service.find_by_name(record_type::LAND, name).unwrap()
}

pub fn refs_to(service: &Service, names: &[&str]) -> Vec<RecordRef> {
    names.iter().map(|name| land(service, name).to_ref()).collect()
}

/// Stores an active plant asset located in `locations`.
pub fn plant_in(service: &Service, name: &str, locations: &[&str]) -> Record {
    let plant = Record::new(record_type::PLANT)
        .with_attribute("name", name)
        .with_attribute("status", "active")
        .with_relationship("location", refs_to(service, locations));
    service.insert_all([plant.clone()]);
    plant
}

/// Stores a tray-seeded plant asset of `crop`.
pub fn seedling(service: &Service, crop: &str) -> Record {
    let crop = service
        .find_by_name(record_type::PLANT_TYPE, crop)
        .unwrap();
    let plant = Record::new(record_type::PLANT)
        .with_attribute("name", format!("2024-03-01_{}", crop.name().unwrap()))
        .with_attribute("status", "active")
        .with_relationship("plant_type", vec![crop.to_ref()]);
    service.insert_all([plant.clone()]);
    plant
}

pub fn decimal(record: &Record) -> f64 {
    record.attributes["value"]["decimal"].as_f64().unwrap()
}
