//! Delete-safety policy
//!
//! Deleting a VM instance also deletes every attached resource whose delete
//! option is `Delete`. The rename only works if every disk and NIC survives, so
//! the policy must pass before the source VM is touched.

use crate::model::DeleteOption;
use crate::snapshot::VmSnapshot;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachedResourceKind {
    OsDisk,
    DataDisk,
    NetworkInterface,
}

impl fmt::Display for AttachedResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OsDisk => "OS disk",
            Self::DataDisk => "data disk",
            Self::NetworkInterface => "network interface",
        };
        f.write_str(label)
    }
}

/// An attached resource that would be destroyed along with the VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionViolation {
    pub kind: AttachedResourceKind,
    pub resource: String,
}

impl fmt::Display for DeletionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} has deleteOption=Delete", self.kind, self.resource)
    }
}

pub struct DeletionSafetyPolicy;

impl DeletionSafetyPolicy {
    /// Every attached resource whose delete option is `Delete`, OS disk first,
    /// then data disks, then NICs.
    pub fn violations(snapshot: &VmSnapshot) -> Vec<DeletionViolation> {
        let mut violations = Vec::new();

        if is_destructive(snapshot.os_disk.delete_option) {
            violations.push(DeletionViolation {
                kind: AttachedResourceKind::OsDisk,
                resource: snapshot
                    .os_disk
                    .name
                    .clone()
                    .unwrap_or_else(|| snapshot.os_disk.backing.reference().to_string()),
            });
        }

        for disk in &snapshot.data_disks {
            if is_destructive(disk.delete_option) {
                violations.push(DeletionViolation {
                    kind: AttachedResourceKind::DataDisk,
                    resource: disk
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("lun {}", disk.lun)),
                });
            }
        }

        for nic in &snapshot.nics {
            if is_destructive(nic.delete_option) {
                violations.push(DeletionViolation {
                    kind: AttachedResourceKind::NetworkInterface,
                    resource: nic.id.clone(),
                });
            }
        }

        violations
    }

    pub fn verify(snapshot: &VmSnapshot) -> Result<()> {
        let violations = Self::violations(snapshot);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::UnsafeDeletion(violations))
        }
    }
}

fn is_destructive(option: Option<DeleteOption>) -> bool {
    option == Some(DeleteOption::Delete)
}
