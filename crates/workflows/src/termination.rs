//! Terminating plantings as part of a soil disturbance.

use chrono::NaiveDate;
use lookups::IdMap;
use record_store::{Record, RecordId, RecordRef, record_type};

use crate::records::{log, movement};

/// Status given to a plant that no longer occupies any bed.
pub const ARCHIVED: &str = "archived";

/// What terminating a plant in some of its beds does to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationPlan {
    pub plant: Record,
    /// Beds the plant still occupies afterwards.
    pub remaining_beds: Vec<RecordRef>,
    /// True if the plant is archived: every bed it occupied was terminated,
    /// or it occupied no beds at all.
    pub archive: bool,
}

impl TerminationPlan {
    pub fn new(plant: Record, assigned: &[RecordRef], terminated: &[RecordId]) -> Self {
        let remaining_beds: Vec<RecordRef> = assigned
            .iter()
            .filter(|bed| !terminated.contains(&bed.id))
            .cloned()
            .collect();
        let archive = remaining_beds.is_empty();

        Self {
            plant,
            remaining_beds,
            archive,
        }
    }
}

/// Returns the beds among a plant's current locations.
pub fn assigned_beds(plant: &Record, beds: &IdMap) -> Vec<RecordRef> {
    plant
        .related("location")
        .iter()
        .filter(|location| beds.contains_key(&location.id))
        .cloned()
        .collect()
}

/// The movement log that takes a plant out of its terminated beds.
///
/// The plant moves to `location` plus the beds it keeps.
pub fn termination_log(
    date: NaiveDate,
    location: &RecordRef,
    plan: &TerminationPlan,
    category: &[RecordRef],
) -> Record {
    let name = format!("{date}_soil_disturbance_termination_{}", plan.plant.id);
    let locations = std::iter::once(location.clone())
        .chain(plan.remaining_beds.iter().cloned())
        .collect();

    movement(log(record_type::ACTIVITY_LOG, name, date), true)
        .with_relationship("location", locations)
        .with_relationship("asset", vec![plan.plant.to_ref()])
        .with_relationship("category", category.to_vec())
}
