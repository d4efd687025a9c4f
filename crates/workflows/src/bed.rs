//! Adding a bed to a field or greenhouse.

use record_store::{Record, RecordService, record_type};
use saga::ResultBundle;
use serde::{Deserialize, Serialize};

use crate::ops::create_record_op;
use crate::{FarmContext, RecordOperation, Result, WorkflowError, WorkflowKind, validate};

/// Name of the single operation, and its key in the result bundle.
pub const BED_OP: &str = "bed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddBedForm {
    /// Field or greenhouse the bed belongs to.
    pub parent: String,
    pub name: String,
}

impl AddBedForm {
    pub fn validate(&self) -> Result<()> {
        validate::required("Parent", &self.parent)?;
        validate::required("Bed name", &self.name)
    }
}

/// Builds the operation that creates the bed, without running it.
pub async fn build_operations<R>(ctx: &FarmContext<R>, form: &AddBedForm) -> Result<Vec<RecordOperation>>
where
    R: RecordService + 'static,
{
    form.validate()?;

    let lookups = ctx.lookups();
    let name = form.name.trim().to_string();
    if lookups.field_or_bed_name_map().await?.contains_key(&name) {
        return Err(WorkflowError::validation(format!(
            "A field or bed named {name} already exists."
        )));
    }
    let parent = lookups.planting_location_refs(&[&form.parent]).await?;

    let bed = Record::new(record_type::LAND)
        .with_attribute("name", name)
        .with_attribute("land_type", "bed")
        .with_attribute("status", "active")
        .with_relationship("parent", parent);

    Ok(vec![create_record_op(ctx.service().clone(), BED_OP, move |_| {
        Ok(bed.clone())
    })])
}

/// Creates a bed. Cached fields and beds are refreshed on the next lookup.
#[tracing::instrument(skip(ctx, form), fields(parent = %form.parent, bed = %form.name))]
pub async fn submit<R>(ctx: &FarmContext<R>, form: &AddBedForm) -> Result<ResultBundle<Record>>
where
    R: RecordService + 'static,
{
    let operations = build_operations(ctx, form).await?;
    ctx.submit(WorkflowKind::AddBed, operations).await
}
