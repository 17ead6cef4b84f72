use crate::features::snapshot_backup::repo::SnapshotStore;
use crate::features::vm_rename::repo::VirtualMachineRepository;
use crate::shared::error::{RenameError, RenameResult};
use crate::shared::types::{
    RenameReport, RenameRequest, RenameStage, RestoreRequest, VirtualMachine, VmSnapshot,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vmrename_core::naming::validate_vm_name;
use vmrename_core::{rebuild, CoreError, DeletionSafetyPolicy};

/// Service that renames a VM by deleting it and recreating it around the
/// same disks and NICs
pub struct RenameService {
    repo: Arc<dyn VirtualMachineRepository>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl RenameService {
    pub fn new(repo: Arc<dyn VirtualMachineRepository>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { repo, snapshots }
    }

    fn validate_rename(request: &RenameRequest) -> RenameResult<()> {
        if request.resource_group.trim().is_empty() {
            return Err(RenameError::InvalidRequest(
                "Resource group cannot be empty".to_string(),
            ));
        }
        if request.old_name.trim().is_empty() {
            return Err(RenameError::InvalidRequest(
                "Old VM name cannot be empty".to_string(),
            ));
        }

        validate_vm_name(&request.new_name)?;

        // ARM resource names are case-insensitive, so a case-only change is a no-op
        if request.old_name.eq_ignore_ascii_case(&request.new_name) {
            return Err(RenameError::InvalidRequest(format!(
                "New name {} is the same as the current name",
                request.new_name
            )));
        }

        Ok(())
    }

    async fn ensure_name_free(&self, resource_group: &str, name: &str) -> RenameResult<()> {
        if self.repo.get(resource_group, name).await?.is_some() {
            return Err(RenameError::NameConflict(format!(
                "{resource_group}/{name} already exists"
            )));
        }
        Ok(())
    }

    /// Build the new VM definition one stage at a time.
    fn build_definition(
        report: &mut RenameReport,
        snapshot: &VmSnapshot,
        name: &str,
    ) -> VirtualMachine {
        let mut vm = rebuild::base_definition(snapshot, name);
        report.complete(RenameStage::Rebuild);

        rebuild::attach_os_disk(&mut vm, snapshot);
        report.complete(RenameStage::AttachOsDisk);

        rebuild::attach_nics(&mut vm, snapshot);
        report.complete(RenameStage::AttachNics);

        rebuild::attach_data_disks(&mut vm, snapshot);
        report.complete(RenameStage::AttachDataDisks);

        rebuild::apply_security_profile(&mut vm, snapshot);
        report.complete(RenameStage::ApplySecurityProfile);

        vm
    }

    async fn create(
        &self,
        report: &mut RenameReport,
        definition: &VirtualMachine,
        snapshot_location: &str,
    ) -> RenameResult<()> {
        let created = self
            .repo
            .create_or_update(&report.resource_group, &report.target_name, definition)
            .await
            .map_err(|e| RenameError::RecreateFailed {
                vm: format!("{}/{}", report.resource_group, report.target_name),
                snapshot: snapshot_location.to_string(),
                message: e.to_string(),
            })?;

        report.created = true;
        report.new_vm_id = created.id;
        report.complete(RenameStage::Create);
        Ok(())
    }

    /// Rename a VM
    pub async fn rename(&self, request: RenameRequest) -> RenameResult<RenameReport> {
        let mut report = RenameReport::new(
            &request.resource_group,
            &request.old_name,
            &request.new_name,
            request.dry_run,
        );

        Self::validate_rename(&request)?;
        report.complete(RenameStage::ValidateRequest);

        let rg = request.resource_group.as_str();
        let source = self
            .repo
            .get(rg, &request.old_name)
            .await?
            .ok_or_else(|| RenameError::VmNotFound(format!("{}/{}", rg, request.old_name)))?;
        self.ensure_name_free(rg, &request.new_name).await?;
        report.complete(RenameStage::Locate);

        let snapshot = VmSnapshot::capture(&source, rg)?;
        debug!(
            vm = %request.old_name,
            windows = snapshot.is_windows(),
            data_disks = snapshot.data_disks.len(),
            nics = snapshot.nics.len(),
            "Captured VM configuration"
        );
        report.complete(RenameStage::Capture);

        if let Err(err) = DeletionSafetyPolicy::verify(&snapshot) {
            if let CoreError::UnsafeDeletion(violations) = &err {
                for violation in violations {
                    warn!(vm = %request.old_name, %violation, "Refusing to delete VM");
                }
            }
            return Err(err.into());
        }
        report.complete(RenameStage::CheckDeletionSafety);

        let snapshot_location = self
            .snapshots
            .save(&snapshot)
            .await
            .map_err(|e| match e {
                RenameError::Backup(_) => e,
                other => RenameError::Backup(other.to_string()),
            })?;
        report.snapshot_location = Some(snapshot_location.clone());
        report.complete(RenameStage::BackupSnapshot);

        if request.dry_run {
            let definition = Self::build_definition(&mut report, &snapshot, &request.new_name);
            report.definition = Some(definition);
            info!(
                vm = %request.old_name,
                new_name = %request.new_name,
                "Dry run finished, nothing was deleted"
            );
            return Ok(report.finish());
        }

        self.repo
            .delete(rg, &request.old_name)
            .await
            .map_err(|e| RenameError::DeleteFailed {
                vm: format!("{}/{}", rg, request.old_name),
                snapshot: snapshot_location.clone(),
                message: e.to_string(),
            })?;
        report.deleted = true;
        report.complete(RenameStage::Delete);

        let definition = Self::build_definition(&mut report, &snapshot, &request.new_name);
        self.create(&mut report, &definition, &snapshot_location)
            .await?;

        info!(
            vm = %request.old_name,
            new_name = %request.new_name,
            new_vm_id = ?report.new_vm_id,
            "VM renamed successfully"
        );

        Ok(report.finish())
    }

    /// Recreate a VM from a snapshot saved by an earlier rename
    pub async fn restore(&self, request: RestoreRequest) -> RenameResult<RenameReport> {
        if request.snapshot_location.trim().is_empty() {
            return Err(RenameError::InvalidRequest(
                "Snapshot location cannot be empty".to_string(),
            ));
        }

        let snapshot = self.snapshots.load(&request.snapshot_location).await?;
        let target = request
            .name
            .clone()
            .unwrap_or_else(|| snapshot.source_name.clone());

        let mut report = RenameReport::new(
            &snapshot.resource_group,
            &snapshot.source_name,
            &target,
            false,
        );
        report.snapshot_location = Some(request.snapshot_location.clone());
        report.complete(RenameStage::LoadSnapshot);

        validate_vm_name(&target)?;
        report.complete(RenameStage::ValidateRequest);

        self.ensure_name_free(&snapshot.resource_group, &target)
            .await?;
        report.complete(RenameStage::Locate);

        let definition = Self::build_definition(&mut report, &snapshot, &target);
        self.create(&mut report, &definition, &request.snapshot_location)
            .await?;

        info!(
            vm = %target,
            snapshot = %request.snapshot_location,
            "VM restored from snapshot"
        );

        Ok(report.finish())
    }
}
