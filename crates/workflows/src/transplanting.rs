//! Transplanting tray-grown seedlings into a field or greenhouse.

use std::sync::Arc;

use chrono::NaiveDate;
use lookups::EntityKind;
use record_store::{Record, RecordId, RecordService, RecordServiceExt, record_type};
use saga::ResultBundle;
use serde::{Deserialize, Serialize};

use crate::ops::{all_earlier, create_record_op, earlier};
use crate::records::{
    Adjustment, Measure, adjusting, log, movement, name_of, plant_asset, quantity, refs,
};
use crate::soil_disturbance::{Tillage, disturbance_log};
use crate::{FarmContext, RecordOperation, Result, WorkflowKind, validate};

/// Operation names, which are also the keys of the result bundle.
pub mod op {
    pub const PLANT_ASSET: &str = "transplantingPlantAsset";
    pub const BED_FEET_QUANTITY: &str = "transplantingBedFeetQuantity";
    pub const ROWS_PER_BED_QUANTITY: &str = "transplantingRowsPerBedQuantity";
    pub const ROW_FEET_QUANTITY: &str = "transplantingRowFeetQuantity";
    pub const BED_WIDTH_QUANTITY: &str = "transplantingBedWidthQuantity";
    pub const TRANSPLANTING_LOG: &str = "transplantingLog";
    pub const DEPTH_QUANTITY: &str = "depthQuantity";
    pub const SPEED_QUANTITY: &str = "speedQuantity";
    pub const ACTIVITY_LOG: &str = "activityLog";

    /// Name of the trays quantity taken from the `index`th picked seedling.
    pub fn trays_quantity(index: usize) -> String {
        format!("transplantingTraysQuantity{index}")
    }
}

/// Trays taken from one tray-seeded plant asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedTrays {
    pub seedling: RecordId,
    pub trays: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransplantingForm {
    pub date: NaiveDate,
    pub crop: String,
    pub picked: Vec<PickedTrays>,
    pub location: String,
    #[serde(default)]
    pub beds: Vec<String>,
    pub bed_feet: f64,
    pub rows_per_bed: f64,
    /// Bed width in inches.
    pub bed_width: f64,
    /// Equipment used to prepare the beds. Leave empty to skip recording
    /// the soil disturbance.
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub comment: String,
}

impl TransplantingForm {
    pub fn validate(&self) -> Result<()> {
        validate::required("Crop", &self.crop)?;
        validate::required("Location", &self.location)?;
        validate::not_empty("tray of seedlings", &self.picked)?;
        for picked in &self.picked {
            validate::positive("Trays", picked.trays)?;
        }
        validate::positive("Bed feet", self.bed_feet)?;
        validate::positive("Rows per bed", self.rows_per_bed)?;
        validate::positive("Bed width", self.bed_width)?;
        if !self.equipment.is_empty() {
            validate::non_negative("Depth", self.depth)?;
            validate::non_negative("Speed", self.speed)?;
        }
        Ok(())
    }

    pub fn row_feet(&self) -> f64 {
        self.rows_per_bed * self.bed_feet
    }
}

/// Builds the operations for a transplanting without running them.
pub async fn build_operations<R>(
    ctx: &FarmContext<R>,
    form: &TransplantingForm,
) -> Result<Vec<RecordOperation>>
where
    R: RecordService + 'static,
{
    form.validate()?;

    let lookups = ctx.lookups();
    let crop = lookups.resolve(EntityKind::Crops, &form.crop).await?;
    let mut locations = lookups.planting_location_refs(&[&form.location]).await?;
    locations.extend(lookups.planting_location_refs(&form.beds).await?);
    let equipment = lookups
        .resolve_all(EntityKind::Equipment, &form.equipment)
        .await?;
    let category = lookups.log_category_refs(&["transplanting"]).await?;
    let feet = lookups.resolve(EntityKind::Units, "FEET").await?;
    let rows_per_bed = lookups.resolve(EntityKind::Units, "ROWS/BED").await?;
    let inches = lookups.resolve(EntityKind::Units, "INCHES").await?;
    let trays_unit = lookups.resolve(EntityKind::Units, "TRAYS").await?;

    let mut seedlings = Vec::with_capacity(form.picked.len());
    for picked in &form.picked {
        let seedling = ctx
            .service()
            .require(record_type::PLANT, picked.seedling)
            .await?;
        seedlings.push((seedling, picked.trays));
    }

    let service = ctx.service();
    let date = form.date;
    let comment = form.comment.clone();
    let parents = refs(seedlings.iter().map(|(seedling, _)| seedling));
    let plant_crop = crop.clone();

    let mut operations = vec![
        create_record_op(service.clone(), op::PLANT_ASSET, move |_| {
            Ok(plant_asset(date, &plant_crop, &comment, parents.clone()))
        }),
        fixed(service, op::BED_FEET_QUANTITY, quantity(Measure::Length, form.bed_feet, "Bed Feet", &feet)),
        fixed(
            service,
            op::ROWS_PER_BED_QUANTITY,
            quantity(Measure::Ratio, form.rows_per_bed, "Rows/Bed", &rows_per_bed),
        ),
        fixed(service, op::ROW_FEET_QUANTITY, quantity(Measure::Length, form.row_feet(), "Row Feet", &feet)),
        fixed(
            service,
            op::BED_WIDTH_QUANTITY,
            quantity(Measure::Length, form.bed_width, "Bed Width", &inches),
        ),
    ];

    let mut quantity_names = vec![
        op::BED_FEET_QUANTITY.to_string(),
        op::ROWS_PER_BED_QUANTITY.to_string(),
        op::ROW_FEET_QUANTITY.to_string(),
        op::BED_WIDTH_QUANTITY.to_string(),
    ];
    for (index, (seedling, trays)) in seedlings.into_iter().enumerate() {
        let name = op::trays_quantity(index);
        let taken = adjusting(
            quantity(Measure::Count, trays, "Trays", &trays_unit),
            &seedling,
            Adjustment::Decrement,
        );
        operations.push(fixed(service, &name, taken));
        quantity_names.push(name);
    }

    let log_name = format!("{date}_xp_{}", name_of(&crop));
    let log_locations = locations.clone();
    operations.push(create_record_op(service.clone(), op::TRANSPLANTING_LOG, move |results| {
        let plant = earlier(results, op::PLANT_ASSET)?;
        let quantities = all_earlier(results, &quantity_names)?;
        Ok(movement(log(record_type::ACTIVITY_LOG, log_name.clone(), date), true)
            .with_relationship("location", log_locations.clone())
            .with_relationship("asset", vec![plant.to_ref()])
            .with_relationship("quantity", refs(quantities))
            .with_relationship("category", category.clone()))
    }));

    if !equipment.is_empty() {
        let tillage_category = lookups.log_category_refs(&["tillage"]).await?;
        let tillage = Tillage {
            depth: form.depth,
            speed: form.speed,
            inches,
            mph: lookups.resolve(EntityKind::Units, "MPH").await?,
            area: None,
        };
        let template = disturbance_log(
            date,
            &form.location,
            locations,
            &equipment,
            &tillage_category,
            &form.comment,
        );

        operations.extend(tillage.operations(service, "", template, Some(op::PLANT_ASSET)));
    }

    Ok(operations)
}

/// Creates a record that does not depend on earlier results.
fn fixed<R>(service: &Arc<R>, name: &str, record: Record) -> RecordOperation
where
    R: RecordService + 'static,
{
    create_record_op(service.clone(), name, move |_| Ok(record.clone()))
}

/// Creates the plant asset, quantities and logs for a transplanting.
#[tracing::instrument(skip(ctx, form), fields(crop = %form.crop, location = %form.location))]
pub async fn submit<R>(ctx: &FarmContext<R>, form: &TransplantingForm) -> Result<ResultBundle<Record>>
where
    R: RecordService + 'static,
{
    let operations = build_operations(ctx, form).await?;
    ctx.submit(WorkflowKind::Transplanting, operations).await
}
