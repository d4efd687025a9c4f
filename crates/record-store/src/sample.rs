//! A small farm used by tests and the demo server.

use crate::{Record, record_type};

pub const FIELDS: &[&str] = &["A", "ALF", "B", "H"];
pub const ALF_BEDS: &[&str] = &["ALF-1", "ALF-2", "ALF-3", "ALF-4"];
pub const H_BEDS: &[&str] = &["H-1", "H-2"];
pub const GREENHOUSES: &[&str] = &["CHUAU", "GHANA", "JASMINE"];
pub const CHUAU_BEDS: &[&str] = &["CHUAU-1", "CHUAU-2", "CHUAU-3", "CHUAU-4", "CHUAU-5"];
pub const GHANA_BEDS: &[&str] = &["GHANA-1", "GHANA-2"];
pub const CROPS: &[&str] = &["BROCCOLI", "HERB-CILANTRO", "LETTUCE-ICEBERG", "TOMATO"];
pub const LOG_CATEGORIES: &[&str] = &[
    "amendment",
    "irrigation",
    "seeding",
    "termination",
    "tillage",
    "transplanting",
];
pub const UNITS: &[&str] = &[
    "FEET",
    "INCHES",
    "MPH",
    "PERCENT",
    "TRAYS",
    "SEEDS",
    "CELLS/TRAY",
    "ROWS/BED",
];
pub const EQUIPMENT: &[&str] = &["Tractor", "Rotary Tiller", "Chisel Plow"];

/// Name of a field that exists but is archived.
pub const ARCHIVED_FIELD: &str = "Z-RETIRED";
/// Name of an equipment asset that exists but is archived.
pub const ARCHIVED_EQUIPMENT: &str = "Old Disc";

fn named(record_type: &str, name: &str) -> Record {
    Record::new(record_type).with_attribute("name", name)
}

fn land(name: &str, land_type: &str, status: &str) -> Record {
    named(record_type::LAND, name)
        .with_attribute("land_type", land_type)
        .with_attribute("status", status)
}

fn beds_of(parent: &Record, names: &[&str]) -> Vec<Record> {
    names
        .iter()
        .map(|name| land(name, "bed", "active").with_relationship("parent", vec![parent.to_ref()]))
        .collect()
}

/// Builds the sample farm's records with fresh ids.
///
/// Parents always precede their children, so the records can be created in
/// order against a service that checks relationships.
pub fn sample_farm() -> Vec<Record> {
    let mut records = Vec::new();

    for name in LOG_CATEGORIES {
        records.push(named(record_type::LOG_CATEGORY, name));
    }
    for name in UNITS {
        records.push(named(record_type::UNIT, name));
    }
    for name in CROPS {
        records.push(named(record_type::PLANT_TYPE, name));
    }

    for name in FIELDS {
        let field = land(name, "field", "active");
        let beds = match *name {
            "ALF" => beds_of(&field, ALF_BEDS),
            "H" => beds_of(&field, H_BEDS),
            _ => Vec::new(),
        };
        records.push(field);
        records.extend(beds);
    }
    records.push(land(ARCHIVED_FIELD, "field", "archived"));

    for name in GREENHOUSES {
        let greenhouse = named(record_type::STRUCTURE, name)
            .with_attribute("structure_type", "greenhouse")
            .with_attribute("status", "active");
        let beds = match *name {
            "CHUAU" => beds_of(&greenhouse, CHUAU_BEDS),
            "GHANA" => beds_of(&greenhouse, GHANA_BEDS),
            _ => Vec::new(),
        };
        records.push(greenhouse);
        records.extend(beds);
    }

    for name in EQUIPMENT {
        records.push(named(record_type::EQUIPMENT, name).with_attribute("status", "active"));
    }
    records.push(
        named(record_type::EQUIPMENT, ARCHIVED_EQUIPMENT).with_attribute("status", "archived"),
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_precede_children() {
        let records = sample_farm();
        for (index, record) in records.iter().enumerate() {
            for parent in record.related("parent") {
                let position = records.iter().position(|r| r.id == parent.id).unwrap();
                assert!(position < index);
            }
        }
    }

    #[test]
    fn names_are_unique_per_type() {
        let records = sample_farm();
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            assert!(seen.insert((record.record_type.clone(), record.name().unwrap().to_string())));
        }
    }
}
