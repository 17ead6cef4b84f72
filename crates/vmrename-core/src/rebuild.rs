//! Rebuild a VM definition from a captured snapshot.
//!
//! The new VM boots from the OS disk of the old one, so the definition carries
//! no `osProfile` or image reference. Every disk and NIC is attached with
//! `deleteOption = Detach`.

use crate::model::{
    AdditionalCapabilities, BootDiagnostics, DataDisk, DeleteOption, DiagnosticsProfile,
    DiskSecurityProfile, HardwareProfile, ManagedDiskParameters, NetworkInterfaceReference,
    NetworkInterfaceReferenceProperties, NetworkProfile, OsDisk, SecurityProfile,
    StorageProfile, SubResource, UefiSettings, VirtualHardDisk, VirtualMachine,
    CREATE_OPTION_ATTACH,
};
use crate::snapshot::{DiskBacking, VmSnapshot};

/// Base definition: placement, size, tags and the VM-level settings that are
/// not tied to a disk or NIC.
pub fn base_definition(snapshot: &VmSnapshot, new_name: &str) -> VirtualMachine {
    let mut vm = VirtualMachine::new(snapshot.location.clone());
    vm.name = Some(new_name.to_string());
    vm.tags = snapshot.tags.clone();
    vm.zones = snapshot.zones.clone();
    vm.plan = snapshot.plan.clone();

    let props = &mut vm.properties;
    props.hardware_profile = Some(HardwareProfile {
        vm_size: snapshot.vm_size.clone(),
    });
    props.availability_set = snapshot
        .availability_set_id
        .clone()
        .map(|id| SubResource { id });
    props.proximity_placement_group = snapshot
        .proximity_placement_group_id
        .clone()
        .map(|id| SubResource { id });
    props.license_type = snapshot.license_type.clone();
    props.diagnostics_profile = snapshot.boot_diagnostics.as_ref().map(|b| DiagnosticsProfile {
        boot_diagnostics: Some(BootDiagnostics {
            enabled: b.enabled,
            storage_uri: b.storage_uri.clone(),
        }),
    });
    if snapshot.ultra_ssd_enabled.is_some() || snapshot.hibernation_enabled.is_some() {
        props.additional_capabilities = Some(AdditionalCapabilities {
            ultra_ssd_enabled: snapshot.ultra_ssd_enabled,
            hibernation_enabled: snapshot.hibernation_enabled,
        });
    }

    vm
}

pub fn attach_os_disk(vm: &mut VirtualMachine, snapshot: &VmSnapshot) {
    let source = &snapshot.os_disk;
    let (managed_disk, vhd) = backing_parts(&source.backing);
    let managed_disk = managed_disk.map(|mut managed| {
        managed.security_profile =
            source
                .security_encryption_type
                .clone()
                .map(|encryption| DiskSecurityProfile {
                    security_encryption_type: Some(encryption),
                });
        managed
    });

    let os_disk = OsDisk {
        os_type: Some(source.os_type),
        name: source.name.clone(),
        vhd,
        managed_disk,
        caching: source.caching,
        write_accelerator_enabled: source.write_accelerator_enabled,
        create_option: Some(CREATE_OPTION_ATTACH.to_string()),
        disk_size_gb: None,
        delete_option: Some(DeleteOption::Detach),
    };

    storage_profile(vm).os_disk = Some(os_disk);
}

pub fn attach_nics(vm: &mut VirtualMachine, snapshot: &VmSnapshot) {
    let multiple = snapshot.nics.len() > 1;
    let needs_primary = multiple && !snapshot.nics.iter().any(|n| n.primary);

    let network_interfaces = snapshot
        .nics
        .iter()
        .enumerate()
        .map(|(idx, nic)| NetworkInterfaceReference {
            id: nic.id.clone(),
            properties: Some(NetworkInterfaceReferenceProperties {
                primary: if nic.primary || (needs_primary && idx == 0) {
                    Some(true)
                } else if multiple {
                    Some(false)
                } else {
                    None
                },
                delete_option: Some(DeleteOption::Detach),
            }),
        })
        .collect();

    vm.properties.network_profile = Some(NetworkProfile {
        network_interfaces,
        network_interface_configurations: Vec::new(),
    });
}

pub fn attach_data_disks(vm: &mut VirtualMachine, snapshot: &VmSnapshot) {
    let mut data_disks: Vec<DataDisk> = snapshot
        .data_disks
        .iter()
        .map(|disk| {
            let (managed_disk, vhd) = backing_parts(&disk.backing);
            DataDisk {
                lun: disk.lun,
                name: disk.name.clone(),
                vhd,
                managed_disk,
                caching: disk.caching,
                write_accelerator_enabled: disk.write_accelerator_enabled,
                create_option: Some(CREATE_OPTION_ATTACH.to_string()),
                disk_size_gb: disk.size_gb,
                delete_option: Some(DeleteOption::Detach),
            }
        })
        .collect();
    data_disks.sort_by_key(|d| d.lun);

    storage_profile(vm).data_disks = data_disks;
}

/// Trusted Launch and Confidential VMs keep their security type and UEFI
/// settings. Standard VMs only keep encryption at host, if it was set.
pub fn apply_security_profile(vm: &mut VirtualMachine, snapshot: &VmSnapshot) {
    let Some(security) = snapshot.security.as_ref() else {
        vm.properties.security_profile = None;
        return;
    };

    let uefi_settings = if security.is_trusted_launch_or_confidential() {
        Some(UefiSettings {
            secure_boot_enabled: security.secure_boot_enabled,
            v_tpm_enabled: security.vtpm_enabled,
        })
    } else {
        None
    };

    let profile = SecurityProfile {
        security_type: security.security_type,
        uefi_settings,
        encryption_at_host: security.encryption_at_host,
    };

    vm.properties.security_profile = if profile == SecurityProfile::default() {
        None
    } else {
        Some(profile)
    };
}

/// All rebuild steps in pipeline order.
#[cfg(test)]
pub(crate) fn rebuild(snapshot: &VmSnapshot, new_name: &str) -> VirtualMachine {
    let mut vm = base_definition(snapshot, new_name);
    attach_os_disk(&mut vm, snapshot);
    attach_nics(&mut vm, snapshot);
    attach_data_disks(&mut vm, snapshot);
    apply_security_profile(&mut vm, snapshot);
    vm
}

fn storage_profile(vm: &mut VirtualMachine) -> &mut StorageProfile {
    vm.properties
        .storage_profile
        .get_or_insert_with(StorageProfile::default)
}

fn backing_parts(backing: &DiskBacking) -> (Option<ManagedDiskParameters>, Option<VirtualHardDisk>) {
    match backing {
        DiskBacking::Managed {
            id,
            storage_account_type,
        } => (
            Some(ManagedDiskParameters {
                id: Some(id.clone()),
                storage_account_type: storage_account_type.clone(),
                security_profile: None,
            }),
            None,
        ),
        DiskBacking::Unmanaged { vhd_uri } => (
            None,
            Some(VirtualHardDisk {
                uri: vhd_uri.clone(),
            }),
        ),
    }
}
