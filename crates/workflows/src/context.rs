//! Shared state for submitting workflows.

use std::sync::Arc;

use lookups::{CacheStore, EntityKind, LookupResolver};
use record_store::{Record, RecordService};
use saga::{RemediationReport, ResultBundle, SagaRunner};

use crate::soil_disturbance::{self, SoilDisturbanceForm, SoilDisturbanceRecords};
use crate::transplanting::{self, TransplantingForm};
use crate::tray_seeding::{self, TraySeedingForm};
use crate::{AddBedForm, RecordOperation, Result, WorkflowError, bed};

/// The workflows a person can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    TraySeeding,
    Transplanting,
    SoilDisturbance,
    AddBed,
}

impl WorkflowKind {
    /// Returns the saga type recorded in the run's journal.
    pub fn saga_type(&self) -> &'static str {
        match self {
            WorkflowKind::TraySeeding => "tray_seeding",
            WorkflowKind::Transplanting => "transplanting",
            WorkflowKind::SoilDisturbance => "soil_disturbance",
            WorkflowKind::AddBed => "add_bed",
        }
    }

    /// Returns the name shown to people.
    pub fn title(&self) -> &'static str {
        match self {
            WorkflowKind::TraySeeding => "Tray Seeding",
            WorkflowKind::Transplanting => "Transplanting",
            WorkflowKind::SoilDisturbance => "Soil Disturbance",
            WorkflowKind::AddBed => "Bed",
        }
    }

    /// Returns the heading of the remediation report for a failed run.
    pub fn error_heading(&self) -> String {
        format!("Error creating {} records.", self.title())
    }

    /// Returns the cached collections this workflow writes to.
    pub fn invalidates(&self) -> &'static [EntityKind] {
        match self {
            WorkflowKind::AddBed => &[EntityKind::FieldsAndBeds],
            _ => &[],
        }
    }
}

/// The record service and lookups every workflow runs against.
pub struct FarmContext<R> {
    service: Arc<R>,
    lookups: LookupResolver<R>,
}

impl<R> Clone for FarmContext<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            lookups: self.lookups.clone(),
        }
    }
}

impl<R: RecordService + 'static> FarmContext<R> {
    pub fn new(service: Arc<R>, cache: Arc<CacheStore>) -> Self {
        let lookups = LookupResolver::new(service.clone(), cache);
        Self { service, lookups }
    }

    pub fn service(&self) -> &Arc<R> {
        &self.service
    }

    pub fn lookups(&self) -> &LookupResolver<R> {
        &self.lookups
    }

    pub async fn tray_seeding(&self, form: &TraySeedingForm) -> Result<ResultBundle<Record>> {
        tray_seeding::submit(self, form).await
    }

    pub async fn transplanting(&self, form: &TransplantingForm) -> Result<ResultBundle<Record>> {
        transplanting::submit(self, form).await
    }

    pub async fn soil_disturbance(
        &self,
        form: &SoilDisturbanceForm,
    ) -> Result<SoilDisturbanceRecords> {
        soil_disturbance::submit(self, form).await
    }

    pub async fn add_bed(&self, form: &AddBedForm) -> Result<ResultBundle<Record>> {
        bed::submit(self, form).await
    }

    /// Runs a workflow's operations and turns a failure into a report.
    ///
    /// Cached collections the workflow writes to are cleared after a
    /// successful run, and after a failed run that left records behind.
    #[tracing::instrument(
        skip(self, operations),
        fields(workflow = kind.saga_type(), operations = operations.len())
    )]
    pub async fn submit(
        &self,
        kind: WorkflowKind,
        operations: Vec<RecordOperation>,
    ) -> Result<ResultBundle<Record>> {
        let (outcome, journal) = SagaRunner::new(kind.saga_type())
            .run_with_journal(operations)
            .await;
        match outcome {
            Ok(results) => {
                self.invalidate(kind);
                tracing::info!(
                    saga_id = ?journal.saga_id(),
                    records = results.len(),
                    "Workflow submitted"
                );
                Ok(results)
            }
            Err(failure) => {
                if failure.has_orphans() {
                    self.invalidate(kind);
                }

                let orphans =
                    failure.orphans_with(|record| record.name().map(str::to_string));
                let report = RemediationReport::new(kind.error_heading(), orphans);
                tracing::error!(
                    saga_id = ?journal.saga_id(),
                    operation = failure.operation(),
                    error = %failure.error(),
                    orphans = report.orphans.len(),
                    "Workflow submission failed"
                );

                Err(WorkflowError::Submission {
                    report,
                    failure: Box::new(failure),
                    journal: Box::new(journal),
                })
            }
        }
    }

    fn invalidate(&self, kind: WorkflowKind) {
        for entity in kind.invalidates() {
            self.lookups.clear(*entity);
        }
    }
}
