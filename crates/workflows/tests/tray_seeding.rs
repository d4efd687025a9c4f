mod common;

use std::error::Error as _;

use common::{date, decimal, farm};
use lookups::LookupError;
use record_store::{Method, RecordError, record_type};
use saga::SagaState;
use workflows::tray_seeding::{self, op};
use workflows::{TraySeedingForm, WorkflowError};

fn form() -> TraySeedingForm {
    TraySeedingForm {
        date: date(),
        crop: "BROCCOLI".into(),
        location: "CHUAU".into(),
        trays: 2.0,
        tray_size: 128.0,
        seeds_per_cell: 2,
        comment: "early batch".into(),
    }
}

#[tokio::test]
async fn creates_plant_quantities_and_log_in_order() {
    let (ctx, service) = farm();

    let results = ctx.tray_seeding(&form()).await.unwrap();

    let names: Vec<_> = results.names().collect();
    assert_eq!(
        names,
        vec![
            op::PLANT_ASSET,
            op::TRAYS_QUANTITY,
            op::TRAY_SIZE_QUANTITY,
            op::SEEDS_QUANTITY,
            op::SEEDING_LOG
        ]
    );

    let plant = results.get(op::PLANT_ASSET).unwrap();
    assert_eq!(plant.name(), Some("2024-05-01_BROCCOLI"));
    assert_eq!(decimal(results.get(op::SEEDS_QUANTITY).unwrap()), 512.0);

    let trays = results.get(op::TRAYS_QUANTITY).unwrap();
    assert_eq!(trays.related("inventory_asset"), &[plant.to_ref()]);
    assert_eq!(trays.attribute_str("inventory_adjustment"), Some("increment"));

    let log = results.get(op::SEEDING_LOG).unwrap();
    assert_eq!(log.record_type, record_type::SEEDING_LOG);
    assert_eq!(log.name(), Some("2024-05-01_ts_BROCCOLI"));
    assert_eq!(log.related("quantity").len(), 3);

    // The seeding log moves the new plant into the greenhouse.
    let greenhouse = service
        .find_by_name(record_type::STRUCTURE, "CHUAU")
        .unwrap();
    let stored = service.record(plant.id).unwrap();
    assert_eq!(stored.related("location"), &[greenhouse.to_ref()]);
}

#[tokio::test]
async fn build_operations_exposes_the_run_without_writing() {
    let (ctx, service) = farm();

    let operations = tray_seeding::build_operations(&ctx, &form()).await.unwrap();

    let names: Vec<_> = operations.iter().map(|op| op.name()).collect();
    assert_eq!(names.len(), 5);
    assert_eq!(names[0], op::PLANT_ASSET);
    assert_eq!(service.request_count(Method::Create), 0);
}

#[tokio::test]
async fn failed_log_rolls_everything_back() {
    let (ctx, service) = farm();
    let before = service.record_count();
    service.fail_on(Method::Create, record_type::SEEDING_LOG, 500);

    let err = ctx.tray_seeding(&form()).await.unwrap_err();

    let report = err.report().unwrap();
    assert!(report.is_clean());
    assert_eq!(err.to_string(), "Error creating Tray Seeding records.");

    let failure = err.failure().unwrap();
    assert_eq!(failure.operation(), op::SEEDING_LOG);
    assert_eq!(
        err.source().unwrap().source().unwrap().to_string(),
        "Request failed with status code 500"
    );
    assert!(failure.results().iter().all(|(_, value)| value.is_none()));
    assert!(!failure.results().contains(op::SEEDING_LOG));
    assert_eq!(service.record_count(), before);
}

#[tokio::test]
async fn failed_cleanup_names_the_orphaned_plant() {
    let (ctx, service) = farm();
    service.fail_on(Method::Create, record_type::SEEDING_LOG, 500);
    service.fail_on(Method::Delete, record_type::PLANT, 500);

    let err = ctx.tray_seeding(&form()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error creating Tray Seeding records.\n  \
         Result of operation plantAsset could not be cleaned up.\n   \
         Manually delete log or asset with:\n     \
         name: 2024-05-01_BROCCOLI"
    );
    let results = err.failure().unwrap().results();
    assert!(results.get(op::PLANT_ASSET).is_some());
    assert!(results.is_cleaned_up(op::TRAYS_QUANTITY));
    assert!(service.find_by_name(record_type::PLANT, "2024-05-01_BROCCOLI").is_some());
}

#[tokio::test]
async fn failed_submission_carries_the_journal() {
    let (ctx, service) = farm();
    service.fail_on(Method::Create, record_type::SEEDING_LOG, 500);
    service.fail_on(Method::Delete, record_type::PLANT, 500);

    let err = ctx.tray_seeding(&form()).await.unwrap_err();
    let journal = err.journal().unwrap();

    assert_eq!(journal.saga_type(), "tray_seeding");
    assert_eq!(journal.state(), SagaState::Failed);
    assert_eq!(journal.failed_step(), Some(op::SEEDING_LOG));
    assert_eq!(journal.failed_compensations(), [op::PLANT_ASSET]);
    assert_eq!(
        journal.compensated_steps(),
        [op::SEEDS_QUANTITY, op::TRAY_SIZE_QUANTITY, op::TRAYS_QUANTITY]
    );
}

#[tokio::test]
async fn unknown_crop_fails_before_writing() {
    let (ctx, service) = farm();
    let form = TraySeedingForm {
        crop: "KUMQUAT".into(),
        ..form()
    };

    let err = ctx.tray_seeding(&form).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Lookup(LookupError::UnknownName { ref name, .. }) if name == "KUMQUAT"
    ));
    assert_eq!(service.request_count(Method::Create), 0);
}

#[tokio::test]
async fn lookup_fetch_failure_is_reported() {
    let (ctx, service) = farm();
    service.fail_on(Method::Fetch, record_type::PLANT_TYPE, 403);

    let err = ctx.tray_seeding(&form()).await.unwrap_err();

    assert_eq!(err.to_string(), "Unable to fetch crops.");
    assert!(matches!(
        err,
        WorkflowError::Lookup(LookupError::Fetch {
            source: RecordError::Status { status: 403 },
            ..
        })
    ));
}

#[tokio::test]
async fn invalid_form_sends_no_requests() {
    let (ctx, service) = farm();
    let form = TraySeedingForm {
        trays: 0.0,
        ..form()
    };

    let err = ctx.tray_seeding(&form).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Validation(_)));
    assert!(service.requests().is_empty());
}
