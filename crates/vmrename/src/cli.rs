//! Command-line surface and wiring of the ARM-backed controller.

use crate::features::snapshot_backup::repo::FileSnapshotStore;
use crate::features::vm_rename::controller::RenameController;
use crate::features::vm_rename::repo::ArmVirtualMachineRepository;
use crate::features::vm_rename::service::RenameService;
use crate::shared::error::{RenameError, RenameResult};
use crate::shared::types::{RenameRequest, RestoreRequest};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vmrename_arm::{credential_from_env, ArmClient, ArmConfig};

pub const DEFAULT_SNAPSHOT_DIR: &str = "vm-snapshots";

/// Rename an Azure VM by recreating it around its existing disks and NICs
#[derive(Parser, Debug)]
#[command(name = "vmrename")]
#[command(version)]
pub struct Cli {
    /// Azure subscription id
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", global = true)]
    pub subscription: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete a VM and recreate it under a new name
    Rename(RenameArgs),

    /// Recreate a VM from a snapshot saved by an earlier rename
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Resource group holding the VM
    #[arg(short = 'g', long)]
    pub resource_group: String,

    /// Current VM name
    #[arg(long)]
    pub old_name: String,

    /// Name of the recreated VM
    #[arg(long)]
    pub new_name: String,

    /// Capture, check and back up, then print the new definition without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Where snapshot backups are written
    #[arg(long, env = "VMRENAME_SNAPSHOT_DIR", default_value = DEFAULT_SNAPSHOT_DIR)]
    pub snapshot_dir: PathBuf,
}

impl RenameArgs {
    pub fn to_request(&self) -> RenameRequest {
        RenameRequest {
            resource_group: self.resource_group.clone(),
            old_name: self.old_name.clone(),
            new_name: self.new_name.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Snapshot file written by `rename`
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Name for the restored VM (defaults to the name in the snapshot)
    #[arg(long)]
    pub name: Option<String>,
}

impl RestoreArgs {
    pub fn to_request(&self) -> RestoreRequest {
        RestoreRequest {
            snapshot_location: self.snapshot.display().to_string(),
            name: self.name.clone(),
        }
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.snapshot
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Wire a controller against ARM using credentials and settings from the environment.
pub fn build_controller(
    subscription: Option<&str>,
    snapshot_dir: PathBuf,
) -> RenameResult<RenameController> {
    let subscription = subscription
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            RenameError::InvalidRequest(
                "Subscription id is required (--subscription or AZURE_SUBSCRIPTION_ID)".to_string(),
            )
        })?;

    let config = ArmConfig::from_env()?;
    let http = ArmClient::http_client(&config)?;
    let credential = credential_from_env(http.clone(), &config)?;

    info!(
        endpoint = %config.endpoint,
        api_version = %config.compute_api_version,
        snapshot_dir = %snapshot_dir.display(),
        "Using Azure Resource Manager"
    );

    let client = ArmClient::new(http, config, credential);
    let repo = Arc::new(ArmVirtualMachineRepository::new(client, subscription));
    let snapshots = Arc::new(FileSnapshotStore::new(snapshot_dir));
    let service = Arc::new(RenameService::new(repo, snapshots));
    Ok(RenameController::new(service))
}

/// Run the parsed command and return the JSON report.
pub async fn run(cli: Cli) -> Result<String, vmrename_core::ErrorResponse> {
    let subscription = cli.subscription.as_deref();
    let report = match &cli.command {
        Command::Rename(args) => {
            let controller = build_controller(subscription, args.snapshot_dir.clone())?;
            controller.rename(args.to_request()).await?
        }
        Command::Restore(args) => {
            let controller = build_controller(subscription, args.snapshot_dir())?;
            controller.restore(args.to_request()).await?
        }
    };

    serde_json::to_string_pretty(&report).map_err(|e| {
        vmrename_core::ErrorResponse::new("SERIALIZATION_ERROR", e.to_string())
    })
}
