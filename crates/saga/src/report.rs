//! Manual remediation reports for orphaned records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A result that survived a failed run because its compensation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedRecord {
    /// Name of the operation that produced the result.
    pub operation: String,

    /// Something a person can search for to find the record, usually its
    /// name. `None` when the record carries nothing identifying.
    pub summary: Option<String>,
}

impl OrphanedRecord {
    pub fn new(operation: impl Into<String>, summary: Option<String>) -> Self {
        Self {
            operation: operation.into(),
            summary,
        }
    }
}

/// What a person has to clean up after a failed run.
///
/// The structured form is primary; `Display` renders the text shown to users:
///
/// ```text
/// Error creating Tray Seeding records.
///   Result of operation plantAsset could not be cleaned up.
///    Manually delete log or asset with:
///      name: 2024-05-01_BROCCOLI
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationReport {
    pub heading: String,
    pub orphans: Vec<OrphanedRecord>,
}

impl RemediationReport {
    pub fn new(heading: impl Into<String>, orphans: Vec<OrphanedRecord>) -> Self {
        Self {
            heading: heading.into(),
            orphans,
        }
    }

    /// Returns true if nothing needs manual cleanup.
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
    }
}

impl fmt::Display for RemediationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.heading)?;
        for orphan in &self.orphans {
            write!(
                f,
                "\n  Result of operation {} could not be cleaned up.",
                orphan.operation
            )?;
            match &orphan.summary {
                Some(name) => write!(f, "\n   Manually delete log or asset with:\n     name: {name}")?,
                None => f.write_str("\n   May be safely ignored")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_is_just_the_heading() {
        let report = RemediationReport::new("Error creating Tray Seeding records.", vec![]);
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "Error creating Tray Seeding records.");
    }

    #[test]
    fn renders_named_and_unnamed_orphans() {
        let report = RemediationReport::new(
            "Error creating Transplanting records.",
            vec![
                OrphanedRecord::new("transplantingPlantAsset", Some("2024-05-01_BROCCOLI".into())),
                OrphanedRecord::new("transplantingBedFeetQuantity", None),
            ],
        );

        assert_eq!(
            report.to_string(),
            "Error creating Transplanting records.\n  \
             Result of operation transplantingPlantAsset could not be cleaned up.\n   \
             Manually delete log or asset with:\n     \
             name: 2024-05-01_BROCCOLI\n  \
             Result of operation transplantingBedFeetQuantity could not be cleaned up.\n   \
             May be safely ignored"
        );
    }
}
