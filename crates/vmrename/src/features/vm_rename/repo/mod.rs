use crate::shared::error::{RenameError, RenameResult};
use crate::shared::types::VirtualMachine;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use vmrename_arm::{ArmClient, Url, VirtualMachineId};

/// Repository trait for VM resources in a subscription
#[async_trait]
pub trait VirtualMachineRepository: Send + Sync {
    /// Retrieve a VM by resource group and name
    async fn get(&self, resource_group: &str, name: &str) -> RenameResult<Option<VirtualMachine>>;

    /// Delete a VM and wait until it is gone
    async fn delete(&self, resource_group: &str, name: &str) -> RenameResult<()>;

    /// Create a VM and wait until provisioning finishes
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> RenameResult<VirtualMachine>;
}

/// Azure Resource Manager implementation of the VM repository
pub struct ArmVirtualMachineRepository {
    client: ArmClient,
    subscription_id: String,
}

impl ArmVirtualMachineRepository {
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    fn url(&self, resource_group: &str, name: &str) -> RenameResult<Url> {
        VirtualMachineId::new(&self.subscription_id, resource_group, name)
            .url(self.client.config())
            .map_err(Into::into)
    }
}

#[async_trait]
impl VirtualMachineRepository for ArmVirtualMachineRepository {
    async fn get(&self, resource_group: &str, name: &str) -> RenameResult<Option<VirtualMachine>> {
        let url = self.url(resource_group, name)?;
        Ok(self.client.get_json(&url).await?)
    }

    async fn delete(&self, resource_group: &str, name: &str) -> RenameResult<()> {
        let url = self.url(resource_group, name)?;
        Ok(self.client.delete(&url).await?)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> RenameResult<VirtualMachine> {
        let url = self.url(resource_group, name)?;
        Ok(self.client.put_json(&url, vm).await?)
    }
}

/// Call made against the in-memory repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Get(String),
    Delete(String),
    Create(String),
}

/// In-memory implementation of the VM repository
///
/// Names are case-insensitive, like ARM resource names. Every call is journaled
/// so callers can check what happened and in which order.
#[derive(Clone, Default)]
pub struct InMemoryVirtualMachineRepository {
    storage: Arc<RwLock<HashMap<String, VirtualMachine>>>,
    journal: Arc<RwLock<Vec<RepoCall>>>,
    fail_create: Arc<RwLock<Option<String>>>,
    fail_delete: Arc<RwLock<Option<String>>>,
}

impl InMemoryVirtualMachineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(resource_group: &str, name: &str) -> String {
        format!("{}/{}", resource_group.to_lowercase(), name.to_lowercase())
    }

    fn lock_error() -> RenameError {
        RenameError::Api("Lock poisoned".to_string())
    }

    fn record(&self, call: RepoCall) -> RenameResult<()> {
        self.journal
            .write()
            .map_err(|_| Self::lock_error())?
            .push(call);
        Ok(())
    }

    /// Seed a VM as if it already existed in `resource_group`.
    pub fn insert(&self, resource_group: &str, vm: VirtualMachine) -> RenameResult<()> {
        let name = vm
            .name
            .clone()
            .ok_or_else(|| RenameError::InvalidRequest("VM has no name".to_string()))?;
        self.storage
            .write()
            .map_err(|_| Self::lock_error())?
            .insert(Self::key(resource_group, &name), vm);
        Ok(())
    }

    /// Make every subsequent create fail with `message`.
    pub fn fail_creates_with(&self, message: impl Into<String>) -> RenameResult<()> {
        *self.fail_create.write().map_err(|_| Self::lock_error())? = Some(message.into());
        Ok(())
    }

    /// Make every subsequent delete fail with `message`.
    pub fn fail_deletes_with(&self, message: impl Into<String>) -> RenameResult<()> {
        *self.fail_delete.write().map_err(|_| Self::lock_error())? = Some(message.into());
        Ok(())
    }

    pub fn calls(&self) -> RenameResult<Vec<RepoCall>> {
        Ok(self.journal.read().map_err(|_| Self::lock_error())?.clone())
    }

    pub fn contains(&self, resource_group: &str, name: &str) -> RenameResult<bool> {
        Ok(self
            .storage
            .read()
            .map_err(|_| Self::lock_error())?
            .contains_key(&Self::key(resource_group, name)))
    }
}

#[async_trait]
impl VirtualMachineRepository for InMemoryVirtualMachineRepository {
    async fn get(&self, resource_group: &str, name: &str) -> RenameResult<Option<VirtualMachine>> {
        self.record(RepoCall::Get(name.to_string()))?;
        let storage = self.storage.read().map_err(|_| Self::lock_error())?;
        Ok(storage.get(&Self::key(resource_group, name)).cloned())
    }

    async fn delete(&self, resource_group: &str, name: &str) -> RenameResult<()> {
        self.record(RepoCall::Delete(name.to_string()))?;

        if let Some(message) = self
            .fail_delete
            .read()
            .map_err(|_| Self::lock_error())?
            .clone()
        {
            return Err(RenameError::Api(message));
        }

        let mut storage = self.storage.write().map_err(|_| Self::lock_error())?;
        storage.remove(&Self::key(resource_group, name));
        Ok(())
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> RenameResult<VirtualMachine> {
        self.record(RepoCall::Create(name.to_string()))?;

        if let Some(message) = self
            .fail_create
            .read()
            .map_err(|_| Self::lock_error())?
            .clone()
        {
            return Err(RenameError::Api(message));
        }

        let mut created = vm.clone();
        created.id = Some(format!(
            "/subscriptions/in-memory/resourceGroups/{resource_group}/providers/Microsoft.Compute/virtualMachines/{name}"
        ));
        created.name = Some(name.to_string());
        created.properties.provisioning_state = Some("Succeeded".to_string());

        let mut storage = self.storage.write().map_err(|_| Self::lock_error())?;
        storage.insert(Self::key(resource_group, name), created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(name: &str) -> VirtualMachine {
        let mut vm = VirtualMachine::new("westeurope");
        vm.name = Some(name.to_string());
        vm
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.insert("rg", vm("web-01")).unwrap();

        let found = repo.get("rg", "web-01").await.unwrap();
        assert_eq!(found.unwrap().name.as_deref(), Some("web-01"));
    }

    #[tokio::test]
    async fn test_names_are_case_insensitive() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.insert("Prod-RG", vm("Web-01")).unwrap();

        assert!(repo.get("prod-rg", "WEB-01").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let repo = InMemoryVirtualMachineRepository::new();
        assert!(repo.get("rg", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_vm() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.insert("rg", vm("web-01")).unwrap();

        repo.delete("rg", "web-01").await.unwrap();
        assert!(!repo.contains("rg", "web-01").unwrap());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_state() {
        let repo = InMemoryVirtualMachineRepository::new();
        let created = repo
            .create_or_update("rg", "web-02", &vm("web-02"))
            .await
            .unwrap();

        assert!(created.id.unwrap().ends_with("/virtualMachines/web-02"));
        assert_eq!(
            created.properties.provisioning_state.as_deref(),
            Some("Succeeded")
        );
        assert!(repo.contains("rg", "web-02").unwrap());
    }

    #[tokio::test]
    async fn test_injected_create_failure() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.fail_creates_with("QuotaExceeded").unwrap();

        let err = repo
            .create_or_update("rg", "web-02", &vm("web-02"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("QuotaExceeded"));
        assert!(!repo.contains("rg", "web-02").unwrap());
    }

    #[tokio::test]
    async fn test_injected_delete_failure_keeps_vm() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.insert("rg", vm("web-01")).unwrap();
        repo.fail_deletes_with("ScopeLocked").unwrap();

        let err = repo.delete("rg", "web-01").await.unwrap_err();
        assert!(err.to_string().contains("ScopeLocked"));
        assert!(repo.contains("rg", "web-01").unwrap());
        assert_eq!(repo.calls().unwrap(), vec![RepoCall::Delete("web-01".to_string())]);
    }

    #[tokio::test]
    async fn test_journal_records_call_order() {
        let repo = InMemoryVirtualMachineRepository::new();
        repo.insert("rg", vm("web-01")).unwrap();

        repo.get("rg", "web-01").await.unwrap();
        repo.delete("rg", "web-01").await.unwrap();
        repo.create_or_update("rg", "web-02", &vm("web-02"))
            .await
            .unwrap();

        assert_eq!(
            repo.calls().unwrap(),
            vec![
                RepoCall::Get("web-01".to_string()),
                RepoCall::Delete("web-01".to_string()),
                RepoCall::Create("web-02".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let repo = InMemoryVirtualMachineRepository::new();
        let repo_clone = repo.clone();

        repo.insert("rg", vm("web-01")).unwrap();
        assert!(repo_clone.contains("rg", "web-01").unwrap());
    }
}
