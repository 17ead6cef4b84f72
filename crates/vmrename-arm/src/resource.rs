use crate::{ArmConfig, ArmError, ArmResult};
use reqwest::Url;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMachineId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl VirtualMachineId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    /// Management URL of the VM, `api-version` included.
    pub fn url(&self, config: &ArmConfig) -> ArmResult<Url> {
        let mut url = Url::parse(&config.endpoint).map_err(|e| {
            ArmError::Config(format!("invalid endpoint '{}': {e}", config.endpoint))
        })?;

        url.path_segments_mut()
            .map_err(|_| ArmError::Config(format!("endpoint '{}' cannot be a base URL", config.endpoint)))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                self.resource_group.as_str(),
                "providers",
                "Microsoft.Compute",
                "virtualMachines",
                self.name.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("api-version", &config.compute_api_version);

        Ok(url)
    }
}

impl fmt::Display for VirtualMachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachines/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}
