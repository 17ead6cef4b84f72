//! ARM payloads shared by the unit tests.

use crate::shared::types::VirtualMachine;
use serde_json::json;

/// A managed-disk Linux VM as returned by a GET on the compute API.
pub fn web_vm(name: &str) -> VirtualMachine {
    let value = json!({
        "id": format!("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/{name}"),
        "name": name,
        "location": "westeurope",
        "tags": { "env": "prod" },
        "zones": ["1"],
        "properties": {
            "hardwareProfile": { "vmSize": "Standard_D2s_v5" },
            "storageProfile": {
                "osDisk": {
                    "osType": "Linux",
                    "name": format!("{name}_OsDisk"),
                    "createOption": "FromImage",
                    "caching": "ReadWrite",
                    "managedDisk": {
                        "id": format!("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/{name}_OsDisk"),
                        "storageAccountType": "Premium_LRS"
                    },
                    "deleteOption": "Detach"
                },
                "dataDisks": [{
                    "lun": 0,
                    "name": "data",
                    "createOption": "Attach",
                    "caching": "ReadOnly",
                    "diskSizeGB": 256,
                    "managedDisk": {
                        "id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/data"
                    },
                    "deleteOption": "Detach"
                }]
            },
            "networkProfile": {
                "networkInterfaces": [{
                    "id": format!("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/{name}-nic"),
                    "properties": { "primary": true }
                }]
            },
            "provisioningState": "Succeeded"
        }
    });

    serde_json::from_value(value).unwrap()
}

/// Same VM, but its data disk would be destroyed together with the VM.
pub fn web_vm_with_deletable_data_disk(name: &str) -> VirtualMachine {
    let mut vm = web_vm(name);
    if let Some(storage) = vm.properties.storage_profile.as_mut() {
        storage.data_disks[0].delete_option = Some(vmrename_core::model::DeleteOption::Delete);
    }
    vm
}
