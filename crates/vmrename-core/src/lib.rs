pub mod model;
pub mod naming;
pub mod rebuild;
pub mod safety;
pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use model::{OsType, SecurityType, VirtualMachine};
pub use safety::{AttachedResourceKind, DeletionSafetyPolicy, DeletionViolation};
pub use snapshot::{DiskBacking, VmSnapshot};

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("Unsafe deletion: {}", join_violations(.0))]
    UnsafeDeletion(Vec<DeletionViolation>),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join_violations(violations: &[DeletionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    pub details: Option<HashMap<String, String>>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: HashMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }
}
