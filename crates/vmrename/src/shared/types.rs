use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub use vmrename_core::{VirtualMachine, VmSnapshot};

/// Request to rename a VM
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub resource_group: String,
    pub old_name: String,
    pub new_name: String,
    pub dry_run: bool,
}

/// Request to recreate a VM from a backed-up snapshot
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub snapshot_location: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameStage {
    ValidateRequest,
    Locate,
    Capture,
    CheckDeletionSafety,
    BackupSnapshot,
    LoadSnapshot,
    Delete,
    Rebuild,
    AttachOsDisk,
    AttachNics,
    AttachDataDisks,
    ApplySecurityProfile,
    Create,
}

/// Outcome of a rename or restore run
#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub run_id: Uuid,
    pub resource_group: String,
    pub source_name: String,
    pub target_name: String,
    pub dry_run: bool,
    pub stages_completed: Vec<RenameStage>,
    pub snapshot_location: Option<String>,
    pub deleted: bool,
    pub created: bool,
    pub new_vm_id: Option<String>,
    /// The definition that would be created; only filled on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<VirtualMachine>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RenameReport {
    pub fn new(
        resource_group: impl Into<String>,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            resource_group: resource_group.into(),
            source_name: source_name.into(),
            target_name: target_name.into(),
            dry_run,
            stages_completed: Vec::new(),
            snapshot_location: None,
            deleted: false,
            created: false,
            new_vm_id: None,
            definition: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn complete(&mut self, stage: RenameStage) {
        info!(run_id = %self.run_id, ?stage, "Stage completed");
        self.stages_completed.push(stage);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_records_stages_in_order() {
        let mut report = RenameReport::new("rg", "web-01", "web-02", false);
        report.complete(RenameStage::ValidateRequest);
        report.complete(RenameStage::Locate);

        let report = report.finish();
        assert_eq!(
            report.stages_completed,
            vec![RenameStage::ValidateRequest, RenameStage::Locate]
        );
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_report_serializes_stage_names() {
        let mut report = RenameReport::new("rg", "web-01", "web-02", true);
        report.complete(RenameStage::CheckDeletionSafety);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stages_completed"][0], "check_deletion_safety");
        assert_eq!(json["dry_run"], true);
        assert!(json.get("definition").is_none());
    }
}
