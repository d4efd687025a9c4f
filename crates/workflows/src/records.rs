//! Builders for the records workflows create.

use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use record_store::{Record, RecordRef, record_type};
use serde_json::json;

/// What a standard quantity measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    Length,
    Ratio,
    Rate,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Count => "count",
            Measure::Length => "length",
            Measure::Ratio => "ratio",
            Measure::Rate => "rate",
        }
    }
}

/// How a quantity changes the inventory of its asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Increment,
    Decrement,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Adjustment::Increment => "increment",
            Adjustment::Decrement => "decrement",
        }
    }
}

/// Formats a form date as a record timestamp at midnight UTC.
pub fn timestamp(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Returns the record's name, or an empty string.
pub fn name_of(record: &Record) -> &str {
    record.name().unwrap_or_default()
}

/// Collects references to `records`.
pub fn refs<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<RecordRef> {
    records.into_iter().map(Record::to_ref).collect()
}

fn notes(comment: &str) -> serde_json::Value {
    json!({ "value": comment })
}

/// A new active plant asset named `<date>_<crop>`.
pub fn plant_asset(date: NaiveDate, crop: &Record, comment: &str, parents: Vec<RecordRef>) -> Record {
    let plant = Record::new(record_type::PLANT)
        .with_attribute("name", format!("{date}_{}", name_of(crop)))
        .with_attribute("status", "active")
        .with_attribute("notes", notes(comment))
        .with_relationship("plant_type", vec![crop.to_ref()]);

    if parents.is_empty() {
        plant
    } else {
        plant.with_relationship("parent", parents)
    }
}

/// A standard quantity in `unit`.
pub fn quantity(measure: Measure, value: f64, label: &str, unit: &Record) -> Record {
    Record::new(record_type::STANDARD_QUANTITY)
        .with_attribute("measure", measure.as_str())
        .with_attribute("value", json!({ "decimal": value }))
        .with_attribute("label", label)
        .with_relationship("units", vec![unit.to_ref()])
}

/// Makes `quantity` adjust the inventory of `asset`.
pub fn adjusting(quantity: Record, asset: &Record, adjustment: Adjustment) -> Record {
    quantity
        .with_attribute("inventory_adjustment", adjustment.as_str())
        .with_relationship("inventory_asset", vec![asset.to_ref()])
}

/// A completed log of `record_type` timestamped at `date`.
pub fn log(record_type: &str, name: impl Into<String>, date: NaiveDate) -> Record {
    Record::new(record_type)
        .with_attribute("name", name.into())
        .with_attribute("timestamp", timestamp(date))
        .with_attribute("status", "done")
}

/// Marks a log as moving its assets to its locations.
pub fn movement(log: Record, is_movement: bool) -> Record {
    log.with_attribute("is_movement", is_movement)
}

/// Attaches a free-text comment.
pub fn with_notes(record: Record, comment: &str) -> Record {
    record.with_attribute("notes", notes(comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn timestamp_is_midnight_utc() {
        assert_eq!(timestamp(date()), "2024-05-01T00:00:00Z");
    }

    #[test]
    fn plant_asset_is_named_by_date_and_crop() {
        let crop = Record::new(record_type::PLANT_TYPE).with_attribute("name", "BROCCOLI");
        let plant = plant_asset(date(), &crop, "first planting", vec![]);

        assert_eq!(plant.name(), Some("2024-05-01_BROCCOLI"));
        assert_eq!(plant.status(), Some("active"));
        assert_eq!(plant.attributes["notes"]["value"], "first planting");
        assert_eq!(plant.related("plant_type"), &[crop.to_ref()]);
        assert!(plant.related("parent").is_empty());
    }

    #[test]
    fn adjusting_quantity_points_at_the_asset() {
        let unit = Record::new(record_type::UNIT).with_attribute("name", "TRAYS");
        let plant = Record::new(record_type::PLANT);
        let trays = adjusting(
            quantity(Measure::Count, 2.5, "Trays", &unit),
            &plant,
            Adjustment::Decrement,
        );

        assert_eq!(trays.attribute_str("measure"), Some("count"));
        assert_eq!(trays.attributes["value"]["decimal"], 2.5);
        assert_eq!(trays.attribute_str("inventory_adjustment"), Some("decrement"));
        assert_eq!(trays.related("inventory_asset"), &[plant.to_ref()]);
        assert_eq!(trays.name(), None);
    }

    #[test]
    fn log_is_done_at_the_date() {
        let log = movement(log(record_type::SEEDING_LOG, "2024-05-01_ts_BROCCOLI", date()), true);
        assert_eq!(log.status(), Some("done"));
        assert_eq!(log.attribute_str("timestamp"), Some("2024-05-01T00:00:00Z"));
        assert_eq!(log.attributes["is_movement"], true);
    }
}
