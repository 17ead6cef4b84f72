use crate::{ArmError, ArmResult};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_COMPUTE_API_VERSION: &str = "2024-07-01";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmConfig {
    pub endpoint: String,
    pub authority: String,
    pub compute_api_version: String,
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            compute_api_version: DEFAULT_COMPUTE_API_VERSION.to_string(),
            poll_interval: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ArmConfig {
    /// Read overrides from the process environment.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `AZURE_RESOURCE_MANAGER_ENDPOINT` | `https://management.azure.com` |
    /// | `AZURE_AUTHORITY_HOST` | `https://login.microsoftonline.com` |
    /// | `VMRENAME_COMPUTE_API_VERSION` | `2024-07-01` |
    /// | `VMRENAME_POLL_INTERVAL_SECS` | `5` |
    /// | `VMRENAME_OPERATION_TIMEOUT_SECS` | `1800` |
    /// | `VMRENAME_REQUEST_TIMEOUT_SECS` | `60` |
    pub fn from_env() -> ArmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ArmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secs = |key: &str, default: Duration| -> ArmResult<Duration> {
            match non_empty(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ArmError::Config(format!("{key}='{raw}' is not a number of seconds: {e}"))),
                None => Ok(default),
            }
        };

        let config = Self {
            endpoint: non_empty("AZURE_RESOURCE_MANAGER_ENDPOINT")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            authority: non_empty("AZURE_AUTHORITY_HOST")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.authority),
            compute_api_version: non_empty("VMRENAME_COMPUTE_API_VERSION")
                .unwrap_or(defaults.compute_api_version),
            poll_interval: secs("VMRENAME_POLL_INTERVAL_SECS", defaults.poll_interval)?,
            operation_timeout: secs("VMRENAME_OPERATION_TIMEOUT_SECS", defaults.operation_timeout)?,
            request_timeout: secs("VMRENAME_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
        };

        if config.operation_timeout.is_zero() {
            return Err(ArmError::Config(
                "VMRENAME_OPERATION_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// OAuth2 scope for tokens accepted by the management endpoint.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.endpoint)
    }
}
