//! VM configuration snapshot
//!
//! The snapshot is captured once from the source VM before anything destructive
//! happens. It is read-only afterwards and is the only input used to rebuild the
//! VM under its new name.

use crate::model::{
    CachingType, DataDisk, DeleteOption, ManagedDiskParameters, OsType, Plan, SecurityType,
    VirtualHardDisk, VirtualMachine,
};
use crate::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Where a disk's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiskBacking {
    Managed {
        id: String,
        storage_account_type: Option<String>,
    },
    Unmanaged {
        vhd_uri: String,
    },
}

impl DiskBacking {
    fn from_parts(
        managed: Option<&ManagedDiskParameters>,
        vhd: Option<&VirtualHardDisk>,
    ) -> Option<Self> {
        if let Some(id) = managed.and_then(|m| m.id.clone()) {
            return Some(Self::Managed {
                id,
                storage_account_type: managed.and_then(|m| m.storage_account_type.clone()),
            });
        }
        vhd.map(|v| Self::Unmanaged {
            vhd_uri: v.uri.clone(),
        })
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed { .. })
    }

    /// Managed disk id or VHD URI.
    pub fn reference(&self) -> &str {
        match self {
            Self::Managed { id, .. } => id,
            Self::Unmanaged { vhd_uri } => vhd_uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDiskSnapshot {
    pub name: Option<String>,
    pub backing: DiskBacking,
    pub os_type: OsType,
    pub caching: Option<CachingType>,
    pub write_accelerator_enabled: Option<bool>,
    pub security_encryption_type: Option<String>,
    pub delete_option: Option<DeleteOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDiskSnapshot {
    pub lun: u32,
    pub name: Option<String>,
    pub backing: DiskBacking,
    pub caching: Option<CachingType>,
    pub size_gb: Option<u32>,
    pub write_accelerator_enabled: Option<bool>,
    pub delete_option: Option<DeleteOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSnapshot {
    pub id: String,
    pub primary: bool,
    pub delete_option: Option<DeleteOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    pub security_type: Option<SecurityType>,
    pub secure_boot_enabled: Option<bool>,
    pub vtpm_enabled: Option<bool>,
    pub encryption_at_host: Option<bool>,
}

impl SecuritySnapshot {
    pub fn is_trusted_launch_or_confidential(&self) -> bool {
        self.security_type.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootDiagnosticsSnapshot {
    pub enabled: bool,
    pub storage_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSnapshot {
    pub source_id: Option<String>,
    pub source_name: String,
    pub resource_group: String,
    pub location: String,
    pub captured_at: DateTime<Utc>,
    pub vm_size: String,
    pub tags: BTreeMap<String, String>,
    pub zones: Vec<String>,
    pub plan: Option<Plan>,
    pub availability_set_id: Option<String>,
    pub proximity_placement_group_id: Option<String>,
    pub license_type: Option<String>,
    pub boot_diagnostics: Option<BootDiagnosticsSnapshot>,
    pub ultra_ssd_enabled: Option<bool>,
    pub hibernation_enabled: Option<bool>,
    pub os_disk: OsDiskSnapshot,
    pub data_disks: Vec<DataDiskSnapshot>,
    pub nics: Vec<NicSnapshot>,
    pub security: Option<SecuritySnapshot>,
}

impl VmSnapshot {
    /// Capture the configuration of `vm`, which lives in `resource_group`.
    pub fn capture(vm: &VirtualMachine, resource_group: &str) -> Result<Self> {
        let source_name = vm
            .name
            .clone()
            .ok_or_else(|| unsupported("VM resource has no name"))?;
        let props = &vm.properties;

        let vm_size = props
            .hardware_profile
            .as_ref()
            .map(|h| h.vm_size.clone())
            .ok_or_else(|| unsupported("VM has no hardware profile"))?;

        let storage = props
            .storage_profile
            .as_ref()
            .ok_or_else(|| unsupported("VM has no storage profile"))?;
        let os_disk = storage
            .os_disk
            .as_ref()
            .ok_or_else(|| unsupported("VM has no OS disk"))?;

        let os_backing = DiskBacking::from_parts(os_disk.managed_disk.as_ref(), os_disk.vhd.as_ref())
            .ok_or_else(|| unsupported("OS disk has neither a managed disk id nor a VHD URI"))?;
        let os_type = os_disk
            .os_type
            .ok_or_else(|| unsupported("OS disk has no OS type"))?;

        let os_disk = OsDiskSnapshot {
            name: os_disk.name.clone(),
            backing: os_backing,
            os_type,
            caching: os_disk.caching,
            write_accelerator_enabled: os_disk.write_accelerator_enabled,
            security_encryption_type: os_disk
                .managed_disk
                .as_ref()
                .and_then(|m| m.security_profile.as_ref())
                .and_then(|s| s.security_encryption_type.clone()),
            delete_option: os_disk.delete_option,
        };

        let data_disks = storage
            .data_disks
            .iter()
            .map(capture_data_disk)
            .collect::<Result<Vec<_>>>()?;

        let network = props
            .network_profile
            .as_ref()
            .ok_or_else(|| unsupported("VM has no network profile"))?;
        if !network.network_interface_configurations.is_empty() {
            return Err(unsupported(
                "VM uses inline network interface configurations; only NIC references can be reattached",
            ));
        }
        if network.network_interfaces.is_empty() {
            return Err(unsupported("VM has no network interfaces"));
        }
        let nics: Vec<NicSnapshot> = network
            .network_interfaces
            .iter()
            .map(|nic| {
                let nic_props = nic.properties.clone().unwrap_or_default();
                NicSnapshot {
                    id: nic.id.clone(),
                    primary: nic_props.primary.unwrap_or(false),
                    delete_option: nic_props.delete_option,
                }
            })
            .collect();

        let security = props.security_profile.as_ref().map(|s| SecuritySnapshot {
            security_type: s.security_type,
            secure_boot_enabled: s.uefi_settings.as_ref().and_then(|u| u.secure_boot_enabled),
            vtpm_enabled: s.uefi_settings.as_ref().and_then(|u| u.v_tpm_enabled),
            encryption_at_host: s.encryption_at_host,
        });

        let boot_diagnostics = props
            .diagnostics_profile
            .as_ref()
            .and_then(|d| d.boot_diagnostics.as_ref())
            .map(|b| BootDiagnosticsSnapshot {
                enabled: b.enabled,
                storage_uri: b.storage_uri.clone(),
            });

        let capabilities = props.additional_capabilities.as_ref();

        debug!(
            vm = %source_name,
            os_type = ?os_disk.os_type,
            managed = os_disk.backing.is_managed(),
            data_disks = data_disks.len(),
            nics = ?nics.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            "Captured VM configuration"
        );

        Ok(Self {
            source_id: vm.id.clone(),
            source_name,
            resource_group: resource_group.to_string(),
            location: vm.location.clone(),
            captured_at: Utc::now(),
            vm_size,
            tags: vm.tags.clone(),
            zones: vm.zones.clone(),
            plan: vm.plan.clone(),
            availability_set_id: props.availability_set.as_ref().map(|s| s.id.clone()),
            proximity_placement_group_id: props
                .proximity_placement_group
                .as_ref()
                .map(|s| s.id.clone()),
            license_type: props.license_type.clone(),
            boot_diagnostics,
            ultra_ssd_enabled: capabilities.and_then(|c| c.ultra_ssd_enabled),
            hibernation_enabled: capabilities.and_then(|c| c.hibernation_enabled),
            os_disk,
            data_disks,
            nics,
            security,
        })
    }

    pub fn is_windows(&self) -> bool {
        self.os_disk.os_type == OsType::Windows
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

fn capture_data_disk(disk: &DataDisk) -> Result<DataDiskSnapshot> {
    let backing = DiskBacking::from_parts(disk.managed_disk.as_ref(), disk.vhd.as_ref())
        .ok_or_else(|| {
            unsupported(format!(
                "data disk at LUN {} has neither a managed disk id nor a VHD URI",
                disk.lun
            ))
        })?;

    Ok(DataDiskSnapshot {
        lun: disk.lun,
        name: disk.name.clone(),
        backing,
        caching: disk.caching,
        size_gb: disk.disk_size_gb,
        write_accelerator_enabled: disk.write_accelerator_enabled,
        delete_option: disk.delete_option,
    })
}

fn unsupported(message: impl Into<String>) -> CoreError {
    CoreError::UnsupportedConfiguration(message.into())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::*;

    pub fn managed_linux_vm() -> VirtualMachine {
        let mut vm = VirtualMachine::new("westeurope");
        vm.id = Some(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/web-01"
                .to_string(),
        );
        vm.name = Some("web-01".to_string());
        vm.tags.insert("env".to_string(), "prod".to_string());
        vm.zones = vec!["1".to_string()];
        vm.properties.hardware_profile = Some(HardwareProfile {
            vm_size: "Standard_D2s_v5".to_string(),
        });
        vm.properties.storage_profile = Some(StorageProfile {
            os_disk: Some(OsDisk {
                os_type: Some(OsType::Linux),
                name: Some("web-01_OsDisk".to_string()),
                managed_disk: Some(ManagedDiskParameters {
                    id: Some("/disks/web-01_OsDisk".to_string()),
                    storage_account_type: Some("Premium_LRS".to_string()),
                    security_profile: None,
                }),
                caching: Some(CachingType::ReadWrite),
                create_option: Some("FromImage".to_string()),
                disk_size_gb: Some(30),
                delete_option: Some(DeleteOption::Detach),
                ..OsDisk::default()
            }),
            data_disks: vec![
                DataDisk {
                    lun: 1,
                    name: Some("logs".to_string()),
                    managed_disk: Some(ManagedDiskParameters {
                        id: Some("/disks/logs".to_string()),
                        ..ManagedDiskParameters::default()
                    }),
                    caching: Some(CachingType::None),
                    create_option: Some("Empty".to_string()),
                    disk_size_gb: Some(64),
                    ..DataDisk::default()
                },
                DataDisk {
                    lun: 0,
                    name: Some("data".to_string()),
                    managed_disk: Some(ManagedDiskParameters {
                        id: Some("/disks/data".to_string()),
                        ..ManagedDiskParameters::default()
                    }),
                    caching: Some(CachingType::ReadOnly),
                    create_option: Some("Empty".to_string()),
                    disk_size_gb: Some(256),
                    write_accelerator_enabled: Some(false),
                    delete_option: Some(DeleteOption::Detach),
                    ..DataDisk::default()
                },
            ],
        });
        vm.properties.network_profile = Some(NetworkProfile {
            network_interfaces: vec![NetworkInterfaceReference {
                id: "/nics/web-01-nic".to_string(),
                properties: Some(NetworkInterfaceReferenceProperties {
                    primary: Some(true),
                    delete_option: None,
                }),
            }],
            network_interface_configurations: Vec::new(),
        });
        vm.properties.diagnostics_profile = Some(DiagnosticsProfile {
            boot_diagnostics: Some(BootDiagnostics {
                enabled: true,
                storage_uri: None,
            }),
        });
        vm.properties.provisioning_state = Some("Succeeded".to_string());
        vm
    }

    pub fn unmanaged_windows_vm() -> VirtualMachine {
        let mut vm = managed_linux_vm();
        vm.name = Some("sql-01".to_string());
        vm.zones.clear();
        vm.properties.license_type = Some("Windows_Server".to_string());
        vm.properties.availability_set = Some(SubResource {
            id: "/availabilitySets/sql".to_string(),
        });
        vm.properties.storage_profile = Some(StorageProfile {
            os_disk: Some(OsDisk {
                os_type: Some(OsType::Windows),
                name: Some("sql-01-os".to_string()),
                vhd: Some(VirtualHardDisk {
                    uri: "https://acct.blob.core.windows.net/vhds/sql-01-os.vhd".to_string(),
                }),
                caching: Some(CachingType::ReadWrite),
                create_option: Some("FromImage".to_string()),
                ..OsDisk::default()
            }),
            data_disks: vec![DataDisk {
                lun: 0,
                name: Some("sql-01-data".to_string()),
                vhd: Some(VirtualHardDisk {
                    uri: "https://acct.blob.core.windows.net/vhds/sql-01-data.vhd".to_string(),
                }),
                caching: Some(CachingType::ReadOnly),
                create_option: Some("Empty".to_string()),
                disk_size_gb: Some(1023),
                ..DataDisk::default()
            }],
        });
        vm
    }

    pub fn trusted_launch_vm() -> VirtualMachine {
        let mut vm = managed_linux_vm();
        vm.properties.security_profile = Some(SecurityProfile {
            security_type: Some(SecurityType::TrustedLaunch),
            uefi_settings: Some(UefiSettings {
                secure_boot_enabled: Some(true),
                v_tpm_enabled: Some(true),
            }),
            encryption_at_host: Some(true),
        });
        vm
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::model::*;

    #[test]
    fn test_capture_managed_linux_vm() {
        let snapshot = VmSnapshot::capture(&managed_linux_vm(), "rg").unwrap();

        assert_eq!(snapshot.source_name, "web-01");
        assert_eq!(snapshot.resource_group, "rg");
        assert_eq!(snapshot.vm_size, "Standard_D2s_v5");
        assert_eq!(snapshot.zones, vec!["1".to_string()]);
        assert!(!snapshot.is_windows());
        assert!(snapshot.os_disk.backing.is_managed());
        assert_eq!(snapshot.os_disk.backing.reference(), "/disks/web-01_OsDisk");
        assert_eq!(snapshot.os_disk.caching, Some(CachingType::ReadWrite));
        assert_eq!(snapshot.data_disks.len(), 2);
        assert_eq!(snapshot.nics.len(), 1);
        assert!(snapshot.nics[0].primary);
        assert!(snapshot.security.is_none());
        assert_eq!(
            snapshot.boot_diagnostics,
            Some(BootDiagnosticsSnapshot {
                enabled: true,
                storage_uri: None
            })
        );
    }

    #[test]
    fn test_capture_unmanaged_windows_vm() {
        let snapshot = VmSnapshot::capture(&unmanaged_windows_vm(), "rg").unwrap();

        assert!(snapshot.is_windows());
        assert_eq!(
            snapshot.os_disk.backing,
            DiskBacking::Unmanaged {
                vhd_uri: "https://acct.blob.core.windows.net/vhds/sql-01-os.vhd".to_string()
            }
        );
        assert!(!snapshot.data_disks[0].backing.is_managed());
        assert_eq!(snapshot.data_disks[0].size_gb, Some(1023));
        assert_eq!(snapshot.license_type.as_deref(), Some("Windows_Server"));
        assert_eq!(
            snapshot.availability_set_id.as_deref(),
            Some("/availabilitySets/sql")
        );
    }

    #[test]
    fn test_capture_trusted_launch_security() {
        let snapshot = VmSnapshot::capture(&trusted_launch_vm(), "rg").unwrap();
        let security = snapshot.security.unwrap();

        assert!(security.is_trusted_launch_or_confidential());
        assert_eq!(security.security_type, Some(SecurityType::TrustedLaunch));
        assert_eq!(security.secure_boot_enabled, Some(true));
        assert_eq!(security.vtpm_enabled, Some(true));
        assert_eq!(security.encryption_at_host, Some(true));
    }

    #[test]
    fn test_capture_confidential_os_disk_encryption_type() {
        let mut vm = trusted_launch_vm();
        if let Some(profile) = vm.properties.security_profile.as_mut() {
            profile.security_type = Some(SecurityType::ConfidentialVm);
        }
        let os_disk = vm
            .properties
            .storage_profile
            .as_mut()
            .and_then(|s| s.os_disk.as_mut())
            .unwrap();
        os_disk.managed_disk.as_mut().unwrap().security_profile = Some(DiskSecurityProfile {
            security_encryption_type: Some("VMGuestStateOnly".to_string()),
        });

        let snapshot = VmSnapshot::capture(&vm, "rg").unwrap();
        assert_eq!(
            snapshot.os_disk.security_encryption_type.as_deref(),
            Some("VMGuestStateOnly")
        );
    }

    #[test]
    fn test_capture_rejects_os_disk_without_backing() {
        let mut vm = managed_linux_vm();
        let os_disk = vm
            .properties
            .storage_profile
            .as_mut()
            .and_then(|s| s.os_disk.as_mut())
            .unwrap();
        os_disk.managed_disk = None;

        let err = VmSnapshot::capture(&vm, "rg").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_capture_rejects_missing_os_type() {
        let mut vm = managed_linux_vm();
        let os_disk = vm
            .properties
            .storage_profile
            .as_mut()
            .and_then(|s| s.os_disk.as_mut())
            .unwrap();
        os_disk.os_type = None;

        let err = VmSnapshot::capture(&vm, "rg").unwrap_err();
        assert!(err.to_string().contains("OS type"));
    }

    #[test]
    fn test_capture_rejects_data_disk_without_backing() {
        let mut vm = managed_linux_vm();
        vm.properties.storage_profile.as_mut().unwrap().data_disks[0].managed_disk = None;

        let err = VmSnapshot::capture(&vm, "rg").unwrap_err();
        assert!(err.to_string().contains("LUN 1"));
    }

    #[test]
    fn test_capture_rejects_vm_without_nics() {
        let mut vm = managed_linux_vm();
        vm.properties
            .network_profile
            .as_mut()
            .unwrap()
            .network_interfaces
            .clear();

        let err = VmSnapshot::capture(&vm, "rg").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_capture_rejects_inline_nic_configurations() {
        let mut vm = managed_linux_vm();
        vm.properties
            .network_profile
            .as_mut()
            .unwrap()
            .network_interface_configurations
            .push(serde_json::json!({ "name": "nic-config" }));

        let err = VmSnapshot::capture(&vm, "rg").unwrap_err();
        assert!(err.to_string().contains("inline network interface"));
    }

    #[test]
    fn test_snapshot_json_survives_backup_file_format() {
        let snapshot = VmSnapshot::capture(&unmanaged_windows_vm(), "rg").unwrap();
        let json = snapshot.to_json_pretty().unwrap();

        assert!(json.contains("\"kind\": \"unmanaged\""));
        let restored = VmSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = VmSnapshot::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
