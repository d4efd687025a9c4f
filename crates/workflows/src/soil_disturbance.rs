//! Tillage passes, optionally terminating the plantings they pass over.

use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use lookups::EntityKind;
use record_store::{Record, RecordId, RecordRef, RecordService, RecordServiceExt, record_type};
use saga::ResultBundle;
use serde::{Deserialize, Serialize};

use crate::ops::{all_earlier, create_record_op, earlier, set_status_op};
use crate::records::{Measure, log, movement, quantity, refs, with_notes};
use crate::termination::{ARCHIVED, TerminationPlan, assigned_beds, termination_log};
use crate::{FarmContext, RecordOperation, Result, WorkflowError, WorkflowKind, validate};

/// Bed value meaning the plant is not in a bed.
pub const NO_BED: &str = "N/A";

/// A row of the plant picker: a plant, and the bed it was picked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedPlant {
    pub plant: RecordId,
    #[serde(default)]
    pub bed: Option<String>,
}

impl PickedPlant {
    fn bed_name(&self) -> Option<&str> {
        self.bed.as_deref().filter(|bed| *bed != NO_BED && !bed.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilDisturbanceForm {
    pub date: NaiveDate,
    pub location: String,
    /// Beds disturbed when no plants are picked.
    #[serde(default)]
    pub beds: Vec<String>,
    #[serde(default)]
    pub termination: bool,
    #[serde(default)]
    pub picked: Vec<PickedPlant>,
    pub equipment: Vec<String>,
    pub depth: f64,
    pub speed: f64,
    pub passes: u32,
    /// Percentage of the location covered by each pass.
    pub area: f64,
    #[serde(default)]
    pub comment: String,
}

impl SoilDisturbanceForm {
    pub fn validate(&self) -> Result<()> {
        validate::required("Location", &self.location)?;
        validate::not_empty("equipment item", &self.equipment)?;
        validate::non_negative("Depth", self.depth)?;
        validate::non_negative("Speed", self.speed)?;
        validate::positive("Passes", f64::from(self.passes))?;
        validate::within("Area", self.area, 0.0, 100.0)?;
        if self.termination && self.picked.is_empty() {
            return Err(WorkflowError::validation(
                "Pick at least one plant to terminate.",
            ));
        }
        Ok(())
    }

    /// Groups picked rows by plant, in the order plants were first picked.
    pub fn beds_by_plant(&self) -> IndexMap<RecordId, Vec<&str>> {
        let mut grouped: IndexMap<RecordId, Vec<&str>> = IndexMap::new();
        for picked in &self.picked {
            let beds = grouped.entry(picked.plant).or_default();
            if let Some(bed) = picked.bed_name() {
                if !beds.contains(&bed) {
                    beds.push(bed);
                }
            }
        }
        grouped
    }
}

/// Everything a soil disturbance touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilDisturbanceRecords {
    pub equipment: Vec<Record>,
    pub affected_plants: Vec<Record>,
    pub results: ResultBundle<Record>,
}

/// One tillage pass: quantities for the pass and the log that holds them.
#[derive(Debug, Clone)]
pub(crate) struct Tillage {
    pub depth: f64,
    pub speed: f64,
    pub inches: Record,
    pub mph: Record,
    /// Area covered and its percent unit, for passes that record it.
    pub area: Option<(f64, Record)>,
}

impl Tillage {
    /// Builds the operations of one pass. Names end in `suffix`.
    ///
    /// `planted` names an earlier operation whose result is the asset the
    /// pass disturbs, for assets created in the same run.
    pub fn operations<R>(
        &self,
        service: &Arc<R>,
        suffix: &str,
        log: Record,
        planted: Option<&'static str>,
    ) -> Vec<RecordOperation>
    where
        R: RecordService + 'static,
    {
        let mut names = vec![format!("depthQuantity{suffix}"), format!("speedQuantity{suffix}")];
        let mut quantities = vec![
            quantity(Measure::Length, self.depth, "Depth", &self.inches),
            quantity(Measure::Rate, self.speed, "Speed", &self.mph),
        ];
        if let Some((area, percent)) = &self.area {
            names.push(format!("areaQuantity{suffix}"));
            quantities.push(quantity(Measure::Ratio, *area, "Area", percent));
        }

        let mut operations: Vec<RecordOperation> = names
            .iter()
            .zip(quantities)
            .map(|(name, quantity)| {
                create_record_op(service.clone(), name.clone(), move |_| Ok(quantity.clone()))
            })
            .collect();

        operations.push(create_record_op(
            service.clone(),
            format!("activityLog{suffix}"),
            move |results| {
                let quantities = all_earlier(results, &names)?;
                let mut log = log.clone().with_relationship("quantity", refs(quantities));
                if let Some(planted) = planted {
                    let plant = earlier(results, planted)?;
                    log = log.with_relationship("asset", vec![plant.to_ref()]);
                }
                Ok(log)
            },
        ));
        operations
    }
}

/// The activity log of a soil disturbance pass, without quantities.
pub(crate) fn disturbance_log(
    date: NaiveDate,
    location_name: &str,
    locations: Vec<RecordRef>,
    equipment: &[Record],
    category: &[RecordRef],
    comment: &str,
) -> Record {
    let log = movement(
        log(record_type::ACTIVITY_LOG, format!("{date}_sd_{location_name}"), date),
        false,
    );
    with_notes(log, comment)
        .with_relationship("location", locations)
        .with_relationship("equipment", refs(equipment))
        .with_relationship("category", category.to_vec())
}

/// A picked plant with its beds resolved.
struct PlantPass {
    plant: Record,
    beds: Vec<RecordRef>,
    termination: Option<TerminationPlan>,
}

/// Everything fetched and resolved before writing.
struct Prepared {
    location: RecordRef,
    beds: Vec<RecordRef>,
    equipment: Vec<Record>,
    categories: Vec<RecordRef>,
    termination_category: Vec<RecordRef>,
    tillage: Tillage,
    plants: Vec<PlantPass>,
}

async fn prepare<R>(ctx: &FarmContext<R>, form: &SoilDisturbanceForm) -> Result<Prepared>
where
    R: RecordService + 'static,
{
    form.validate()?;

    let lookups = ctx.lookups();
    let location = lookups
        .planting_location_refs(&[&form.location])
        .await?
        .remove(0);
    let beds = lookups.planting_location_refs(&form.beds).await?;
    let equipment = lookups
        .resolve_all(EntityKind::Equipment, &form.equipment)
        .await?;

    let mut category_names = vec!["tillage"];
    if form.termination {
        category_names.push("termination");
    }
    let categories = lookups.log_category_refs(&category_names).await?;
    let termination_category = lookups.log_category_refs(&["termination"]).await?;

    let tillage = Tillage {
        depth: form.depth,
        speed: form.speed,
        inches: lookups.resolve(EntityKind::Units, "INCHES").await?,
        mph: lookups.resolve(EntityKind::Units, "MPH").await?,
        area: Some((form.area, lookups.resolve(EntityKind::Units, "PERCENT").await?)),
    };

    let bed_ids = if form.termination {
        Some(lookups.bed_id_map().await?)
    } else {
        None
    };

    let mut plants = Vec::new();
    for (id, bed_names) in form.beds_by_plant() {
        let plant = ctx.service().require(record_type::PLANT, id).await?;
        let beds = lookups.planting_location_refs(&bed_names).await?;
        let termination = bed_ids.as_ref().map(|bed_ids| {
            let terminated: Vec<RecordId> = beds.iter().map(|bed| bed.id).collect();
            TerminationPlan::new(plant.clone(), &assigned_beds(&plant, bed_ids), &terminated)
        });
        plants.push(PlantPass {
            plant,
            beds,
            termination,
        });
    }

    Ok(Prepared {
        location,
        beds,
        equipment,
        categories,
        termination_category,
        tillage,
        plants,
    })
}

fn operations<R>(ctx: &FarmContext<R>, form: &SoilDisturbanceForm, prepared: &Prepared) -> Vec<RecordOperation>
where
    R: RecordService + 'static,
{
    let service = ctx.service();
    let passes = form.passes;
    let log_for = |locations: Vec<RecordRef>, comment: String| {
        disturbance_log(
            form.date,
            &form.location,
            locations,
            &prepared.equipment,
            &prepared.categories,
            &comment,
        )
    };
    let mut operations = Vec::new();

    if prepared.plants.is_empty() {
        let locations: Vec<RecordRef> = std::iter::once(prepared.location.clone())
            .chain(prepared.beds.iter().cloned())
            .collect();
        for pass in 0..passes {
            let comment = format!("Pass {} of {passes}. {}", pass + 1, form.comment);
            let log = log_for(locations.clone(), comment);
            operations.extend(prepared.tillage.operations(service, &pass.to_string(), log, None));
        }
        return operations;
    }

    let count = prepared.plants.len();
    for (index, pass_plant) in prepared.plants.iter().enumerate() {
        if let Some(plan) = &pass_plant.termination {
            let log = termination_log(
                form.date,
                &prepared.location,
                plan,
                &prepared.termination_category,
            );
            operations.push(create_record_op(
                service.clone(),
                format!("terminationLog{index}"),
                move |_| Ok(log.clone()),
            ));
            if plan.archive {
                operations.push(set_status_op(
                    service.clone(),
                    format!("archivePlant{index}"),
                    &plan.plant,
                    ARCHIVED,
                ));
            }
        }

        let locations: Vec<RecordRef> = std::iter::once(prepared.location.clone())
            .chain(pass_plant.beds.iter().cloned())
            .collect();
        for pass in 0..passes {
            let comment = format!(
                "Pass {} of {passes} of Plant Asset {} of {count}. {}",
                pass + 1,
                index + 1,
                form.comment
            );
            let log = log_for(locations.clone(), comment)
                .with_relationship("asset", vec![pass_plant.plant.to_ref()]);
            let suffix = format!("{index}_{pass}");
            operations.extend(prepared.tillage.operations(service, &suffix, log, None));
        }
    }
    operations
}

/// Builds the operations for a soil disturbance without running them.
pub async fn build_operations<R>(
    ctx: &FarmContext<R>,
    form: &SoilDisturbanceForm,
) -> Result<Vec<RecordOperation>>
where
    R: RecordService + 'static,
{
    let prepared = prepare(ctx, form).await?;
    Ok(operations(ctx, form, &prepared))
}

/// Records the passes of a soil disturbance, terminating picked plants
/// when asked to.
#[tracing::instrument(
    skip(ctx, form),
    fields(location = %form.location, passes = form.passes, termination = form.termination)
)]
pub async fn submit<R>(ctx: &FarmContext<R>, form: &SoilDisturbanceForm) -> Result<SoilDisturbanceRecords>
where
    R: RecordService + 'static,
{
    let prepared = prepare(ctx, form).await?;
    let results = ctx
        .submit(WorkflowKind::SoilDisturbance, operations(ctx, form, &prepared))
        .await?;

    Ok(SoilDisturbanceRecords {
        equipment: prepared.equipment,
        affected_plants: prepared.plants.into_iter().map(|pass| pass.plant).collect(),
        results,
    })
}
