pub mod snapshot_backup;
pub mod vm_rename;
