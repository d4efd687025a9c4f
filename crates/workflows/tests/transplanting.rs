mod common;

use common::{date, decimal, farm, refs_to, seedling};
use record_store::{InjectedFailure, Method, RecordError, record_type};
use workflows::transplanting::op;
use workflows::{PickedTrays, TransplantingForm, WorkflowError};

fn form(picked: Vec<PickedTrays>) -> TransplantingForm {
    TransplantingForm {
        date: date(),
        crop: "BROCCOLI".into(),
        picked,
        location: "ALF".into(),
        beds: vec!["ALF-1".into(), "ALF-3".into()],
        bed_feet: 100.0,
        rows_per_bed: 3.0,
        bed_width: 60.0,
        equipment: Vec::new(),
        depth: 0.0,
        speed: 0.0,
        comment: "into the field".into(),
    }
}

#[tokio::test]
async fn without_equipment_skips_soil_disturbance() {
    let (ctx, service) = farm();
    let first = seedling(&service, "BROCCOLI");
    let second = seedling(&service, "BROCCOLI");
    let picked = vec![
        PickedTrays { seedling: first.id, trays: 2.0 },
        PickedTrays { seedling: second.id, trays: 1.5 },
    ];

    let results = ctx.transplanting(&form(picked)).await.unwrap();

    let names: Vec<_> = results.names().collect();
    assert_eq!(
        names,
        vec![
            op::PLANT_ASSET,
            op::BED_FEET_QUANTITY,
            op::ROWS_PER_BED_QUANTITY,
            op::ROW_FEET_QUANTITY,
            op::BED_WIDTH_QUANTITY,
            "transplantingTraysQuantity0",
            "transplantingTraysQuantity1",
            op::TRANSPLANTING_LOG,
        ]
    );
    assert!(!results.contains(op::DEPTH_QUANTITY));
    assert!(!results.contains(op::ACTIVITY_LOG));

    let plant = results.get(op::PLANT_ASSET).unwrap();
    assert_eq!(plant.status(), Some("active"));
    assert_eq!(plant.related("parent"), &[first.to_ref(), second.to_ref()]);
    assert_eq!(decimal(results.get(op::ROW_FEET_QUANTITY).unwrap()), 300.0);

    let taken = results.get("transplantingTraysQuantity1").unwrap();
    assert_eq!(decimal(taken), 1.5);
    assert_eq!(taken.related("inventory_asset"), &[second.to_ref()]);
    assert_eq!(taken.attribute_str("inventory_adjustment"), Some("decrement"));

    let log = results.get(op::TRANSPLANTING_LOG).unwrap();
    assert_eq!(log.name(), Some("2024-05-01_xp_BROCCOLI"));
    assert_eq!(log.related("quantity").len(), 6);

    let located = service.record(plant.id).unwrap();
    assert_eq!(
        located.related("location"),
        refs_to(&service, &["ALF", "ALF-1", "ALF-3"]).as_slice()
    );
}

#[tokio::test]
async fn equipment_adds_soil_disturbance_for_the_new_plant() {
    let (ctx, service) = farm();
    let tray = seedling(&service, "BROCCOLI");
    let form = TransplantingForm {
        equipment: vec!["Tractor".into(), "Rotary Tiller".into()],
        depth: 6.0,
        speed: 3.0,
        ..form(vec![PickedTrays { seedling: tray.id, trays: 1.0 }])
    };

    let results = ctx.transplanting(&form).await.unwrap();

    let tail: Vec<_> = results.names().skip(6).collect();
    assert_eq!(
        tail,
        vec![
            op::TRANSPLANTING_LOG,
            op::DEPTH_QUANTITY,
            op::SPEED_QUANTITY,
            op::ACTIVITY_LOG
        ]
    );

    let plant = results.get(op::PLANT_ASSET).unwrap();
    let activity = results.get(op::ACTIVITY_LOG).unwrap();
    assert_eq!(activity.name(), Some("2024-05-01_sd_ALF"));
    assert_eq!(activity.related("asset"), &[plant.to_ref()]);
    assert_eq!(activity.related("equipment").len(), 2);
    assert_eq!(activity.related("quantity").len(), 2);
    assert_eq!(activity.attributes["is_movement"], false);
    assert_eq!(
        results.get(op::SPEED_QUANTITY).unwrap().attribute_str("measure"),
        Some("rate")
    );
}

#[tokio::test]
async fn missing_seedling_fails_before_writing() {
    let (ctx, service) = farm();
    let missing = record_store::RecordId::new();

    let err = ctx
        .transplanting(&form(vec![PickedTrays { seedling: missing, trays: 1.0 }]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Remote(RecordError::NotFound { id, .. }) if id == missing
    ));
    assert_eq!(service.request_count(Method::Create), 0);
}

#[tokio::test]
async fn failure_after_movement_puts_seedlings_back() {
    let (ctx, service) = farm();
    let tray = seedling(&service, "BROCCOLI");
    let before = service.record_count();
    // The transplanting log succeeds, the soil disturbance log fails.
    service.fail_after(
        Method::Create,
        Some(record_type::ACTIVITY_LOG),
        1,
        InjectedFailure::Network,
    );
    let form = TransplantingForm {
        equipment: vec!["Tractor".into()],
        ..form(vec![PickedTrays { seedling: tray.id, trays: 1.0 }])
    };

    let err = ctx.transplanting(&form).await.unwrap_err();

    let failure = err.failure().unwrap();
    assert_eq!(failure.operation(), op::ACTIVITY_LOG);
    assert_eq!(failure.error().to_string(), "Network Error");
    assert!(err.report().unwrap().is_clean());
    assert!(failure.results().is_cleaned_up(op::TRANSPLANTING_LOG));
    assert_eq!(service.record_count(), before);
    assert_eq!(service.record(tray.id).unwrap(), tray);
}

#[tokio::test]
async fn unknown_bed_is_rejected() {
    let (ctx, service) = farm();
    let tray = seedling(&service, "BROCCOLI");
    let form = TransplantingForm {
        beds: vec!["ALF-9".into()],
        ..form(vec![PickedTrays { seedling: tray.id, trays: 1.0 }])
    };

    let err = ctx.transplanting(&form).await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown planting location: ALF-9");
}

#[tokio::test]
async fn picking_nothing_is_invalid() {
    let (ctx, _) = farm();
    let err = ctx.transplanting(&form(Vec::new())).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid form: At least one tray of seedlings is required."
    );
}
