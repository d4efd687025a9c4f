//! Seeding trays in a greenhouse or field.

use chrono::NaiveDate;
use lookups::EntityKind;
use record_store::{Record, RecordService, record_type};
use saga::ResultBundle;
use serde::{Deserialize, Serialize};

use crate::ops::{all_earlier, create_record_op, earlier};
use crate::records::{Adjustment, Measure, adjusting, log, movement, name_of, plant_asset, quantity, refs};
use crate::{FarmContext, RecordOperation, Result, WorkflowKind, validate};

/// Operation names, which are also the keys of the result bundle.
pub mod op {
    pub const PLANT_ASSET: &str = "plantAsset";
    pub const TRAYS_QUANTITY: &str = "traysQuantity";
    pub const TRAY_SIZE_QUANTITY: &str = "traySizeQuantity";
    pub const SEEDS_QUANTITY: &str = "seedsQuantity";
    pub const SEEDING_LOG: &str = "traySeedingLog";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraySeedingForm {
    pub date: NaiveDate,
    pub crop: String,
    /// Greenhouse or field holding the trays.
    pub location: String,
    pub trays: f64,
    /// Cells per tray.
    pub tray_size: f64,
    pub seeds_per_cell: u32,
    #[serde(default)]
    pub comment: String,
}

impl TraySeedingForm {
    pub fn validate(&self) -> Result<()> {
        validate::required("Crop", &self.crop)?;
        validate::required("Location", &self.location)?;
        validate::positive("Trays", self.trays)?;
        validate::positive("Tray size", self.tray_size)?;
        validate::positive("Seeds per cell", f64::from(self.seeds_per_cell))
    }

    /// Total seeds planted across every tray.
    pub fn total_seeds(&self) -> f64 {
        self.trays * self.tray_size * f64::from(self.seeds_per_cell)
    }
}

/// Builds the operations for a tray seeding without running them.
pub async fn build_operations<R>(
    ctx: &FarmContext<R>,
    form: &TraySeedingForm,
) -> Result<Vec<RecordOperation>>
where
    R: RecordService + 'static,
{
    form.validate()?;

    let lookups = ctx.lookups();
    let crop = lookups.resolve(EntityKind::Crops, &form.crop).await?;
    let location = lookups.planting_location_refs(&[&form.location]).await?;
    let category = lookups.log_category_refs(&["seeding"]).await?;
    let trays_unit = lookups.resolve(EntityKind::Units, "TRAYS").await?;
    let cells_unit = lookups.resolve(EntityKind::Units, "CELLS/TRAY").await?;
    let seeds_unit = lookups.resolve(EntityKind::Units, "SEEDS").await?;

    let service = ctx.service();
    let date = form.date;
    let log_name = format!("{date}_ts_{}", name_of(&crop));
    let comment = form.comment.clone();
    let (trays, tray_size, seeds) = (form.trays, form.tray_size, form.total_seeds());

    Ok(vec![
        create_record_op(service.clone(), op::PLANT_ASSET, move |_| {
            Ok(plant_asset(date, &crop, &comment, Vec::new()))
        }),
        create_record_op(service.clone(), op::TRAYS_QUANTITY, move |results| {
            let plant = earlier(results, op::PLANT_ASSET)?;
            let trays = quantity(Measure::Count, trays, "Trays", &trays_unit);
            Ok(adjusting(trays, plant, Adjustment::Increment))
        }),
        create_record_op(service.clone(), op::TRAY_SIZE_QUANTITY, move |_| {
            Ok(quantity(Measure::Ratio, tray_size, "Tray Size", &cells_unit))
        }),
        create_record_op(service.clone(), op::SEEDS_QUANTITY, move |_| {
            Ok(quantity(Measure::Count, seeds, "Seeds", &seeds_unit))
        }),
        create_record_op(service.clone(), op::SEEDING_LOG, move |results| {
            let plant = earlier(results, op::PLANT_ASSET)?;
            let quantities = all_earlier(
                results,
                &[op::TRAYS_QUANTITY, op::TRAY_SIZE_QUANTITY, op::SEEDS_QUANTITY],
            )?;
            Ok(movement(log(record_type::SEEDING_LOG, log_name.clone(), date), true)
                .with_relationship("location", location.clone())
                .with_relationship("asset", vec![plant.to_ref()])
                .with_relationship("quantity", refs(quantities))
                .with_relationship("category", category.clone()))
        }),
    ])
}

/// Creates the plant asset, quantities and seeding log for a tray seeding.
#[tracing::instrument(skip(ctx, form), fields(crop = %form.crop, location = %form.location))]
pub async fn submit<R>(ctx: &FarmContext<R>, form: &TraySeedingForm) -> Result<ResultBundle<Record>>
where
    R: RecordService + 'static,
{
    let operations = build_operations(ctx, form).await?;
    ctx.submit(WorkflowKind::TraySeeding, operations).await
}
