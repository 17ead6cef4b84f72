pub mod client;
pub mod config;
pub mod credential;
pub mod operation;
pub mod resource;

pub use client::ArmClient;
pub use config::ArmConfig;
pub use credential::{
    credential_from_env, ClientSecretCredential, StaticTokenCredential, TokenCredential,
};
pub use resource::VirtualMachineId;
pub use reqwest::Url;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("ARM API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Operation failed with status {status}: {message}")]
    OperationFailed { status: String, message: String },
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ArmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ArmError::Decode(err.to_string())
        } else {
            ArmError::Http(err.to_string())
        }
    }
}

pub type ArmResult<T> = std::result::Result<T, ArmError>;
