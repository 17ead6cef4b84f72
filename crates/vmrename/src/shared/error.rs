use std::collections::HashMap;
use thiserror::Error;
use vmrename_arm::ArmError;
use vmrename_core::{CoreError, DeletionViolation, ErrorResponse};

/// Rename specific errors
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("VM not found: {0}")]
    VmNotFound(String),
    #[error("Name conflict: {0}")]
    NameConflict(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("Unsafe deletion: {} resource(s) would be deleted with the VM", .0.len())]
    UnsafeDeletion(Vec<DeletionViolation>),
    #[error("Snapshot backup failed: {0}")]
    Backup(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Deleting {vm} failed: {message}; snapshot saved at {snapshot}")]
    DeleteFailed {
        vm: String,
        snapshot: String,
        message: String,
    },
    #[error("Recreating {vm} failed after the source VM was deleted: {message}; snapshot saved at {snapshot}")]
    RecreateFailed {
        vm: String,
        snapshot: String,
        message: String,
    },
}

impl RenameError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RenameError::InvalidRequest(_) => "INVALID_REQUEST",
            RenameError::VmNotFound(_) => "VM_NOT_FOUND",
            RenameError::NameConflict(_) => "NAME_CONFLICT",
            RenameError::UnsupportedConfiguration(_) => "UNSUPPORTED_CONFIGURATION",
            RenameError::UnsafeDeletion(_) => "UNSAFE_DELETION",
            RenameError::Backup(_) => "BACKUP_FAILED",
            RenameError::Api(_) => "API_ERROR",
            RenameError::DeleteFailed { .. } => "DELETE_FAILED",
            RenameError::RecreateFailed { .. } => "RECREATE_FAILED",
        }
    }

    /// Location of the snapshot needed for manual recovery, if one was taken
    /// before the failure.
    pub fn snapshot_location(&self) -> Option<&str> {
        match self {
            RenameError::DeleteFailed { snapshot, .. }
            | RenameError::RecreateFailed { snapshot, .. } => Some(snapshot.as_str()),
            _ => None,
        }
    }
}

impl From<CoreError> for RenameError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidName(msg) => RenameError::InvalidRequest(msg),
            CoreError::UnsupportedConfiguration(msg) => RenameError::UnsupportedConfiguration(msg),
            CoreError::UnsafeDeletion(violations) => RenameError::UnsafeDeletion(violations),
            CoreError::Serialization(msg) => RenameError::Backup(msg),
        }
    }
}

impl From<ArmError> for RenameError {
    fn from(err: ArmError) -> Self {
        RenameError::Api(err.to_string())
    }
}

impl From<RenameError> for ErrorResponse {
    fn from(err: RenameError) -> Self {
        let mut details = HashMap::new();
        if let Some(snapshot) = err.snapshot_location() {
            details.insert("snapshot".to_string(), snapshot.to_string());
        }
        if let RenameError::UnsafeDeletion(violations) = &err {
            for (idx, violation) in violations.iter().enumerate() {
                details.insert(format!("violation_{idx}"), violation.to_string());
            }
        }

        let response = ErrorResponse::new(err.error_code(), err.to_string());
        if details.is_empty() {
            response
        } else {
            response.with_details(details)
        }
    }
}

pub type RenameResult<T> = std::result::Result<T, RenameError>;
