//! Cached entity kinds.

use std::fmt;

use record_store::{RecordQuery, record_type};

/// A collection of records that is fetched once and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Active land assets that are fields or beds.
    FieldsAndBeds,
    /// Active structures of type greenhouse.
    Greenhouses,
    /// Plant type taxonomy terms.
    Crops,
    LogCategories,
    /// Active equipment assets.
    Equipment,
    Units,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::FieldsAndBeds,
        EntityKind::Greenhouses,
        EntityKind::Crops,
        EntityKind::LogCategories,
        EntityKind::Equipment,
        EntityKind::Units,
    ];

    /// Returns the key this kind is cached under.
    pub fn cache_key(&self) -> &'static str {
        match self {
            EntityKind::FieldsAndBeds => "fields_and_beds",
            EntityKind::Greenhouses => "greenhouses",
            EntityKind::Crops => "crops",
            EntityKind::LogCategories => "log_categories",
            EntityKind::Equipment => "equipment",
            EntityKind::Units => "units",
        }
    }

    /// Returns the human-readable plural used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::FieldsAndBeds => "fields and beds",
            EntityKind::Greenhouses => "greenhouses",
            EntityKind::Crops => "crops",
            EntityKind::LogCategories => "log categories",
            EntityKind::Equipment => "equipment",
            EntityKind::Units => "units",
        }
    }

    /// Parses a kind from its cache key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.cache_key() == key)
    }

    /// Returns the record service query that fetches this collection.
    pub fn query(&self) -> RecordQuery {
        match self {
            EntityKind::FieldsAndBeds => RecordQuery::for_type(record_type::LAND)
                .filter_any("land_type", ["field", "bed"])
                .active(),
            EntityKind::Greenhouses => RecordQuery::for_type(record_type::STRUCTURE)
                .filter("structure_type", "greenhouse")
                .active(),
            EntityKind::Crops => RecordQuery::for_type(record_type::PLANT_TYPE),
            EntityKind::LogCategories => RecordQuery::for_type(record_type::LOG_CATEGORY),
            EntityKind::Equipment => RecordQuery::for_type(record_type::EQUIPMENT).active(),
            EntityKind::Units => RecordQuery::for_type(record_type::UNIT),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_key(kind.cache_key()), Some(kind));
        }
        assert_eq!(EntityKind::from_key("tractors"), None);
    }

    #[test]
    fn land_query_targets_fields_and_beds() {
        let query = EntityKind::FieldsAndBeds.query();
        assert_eq!(query.record_type, record_type::LAND);
        assert_eq!(query.filters.len(), 2);
    }
}
