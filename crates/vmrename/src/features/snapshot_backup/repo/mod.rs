use crate::shared::error::{RenameError, RenameResult};
use crate::shared::types::VmSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Durable store for VM snapshots taken before deletion
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot and return where it was stored
    async fn save(&self, snapshot: &VmSnapshot) -> RenameResult<String>;

    /// Load a snapshot previously returned by `save`
    async fn load(&self, location: &str) -> RenameResult<VmSnapshot>;
}

/// Writes each snapshot as a pretty-printed JSON file under `dir`
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(snapshot: &VmSnapshot) -> String {
        format!(
            "{}_{}_{}.json",
            snapshot.resource_group,
            snapshot.source_name,
            snapshot.captured_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &VmSnapshot) -> RenameResult<String> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            RenameError::Backup(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(Self::file_name(snapshot));
        let json = snapshot.to_json_pretty()?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| RenameError::Backup(format!("cannot write {}: {}", path.display(), e)))?;

        let location = path.display().to_string();
        info!(location = %location, vm = %snapshot.source_name, "Snapshot saved");
        Ok(location)
    }

    async fn load(&self, location: &str) -> RenameResult<VmSnapshot> {
        let json = tokio::fs::read_to_string(location)
            .await
            .map_err(|e| RenameError::Backup(format!("cannot read {location}: {e}")))?;
        Ok(VmSnapshot::from_json(&json)?)
    }
}

/// In-memory snapshot store
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    storage: Arc<RwLock<HashMap<String, VmSnapshot>>>,
    fail_saves: Arc<RwLock<bool>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error() -> RenameError {
        RenameError::Backup("Lock poisoned".to_string())
    }

    /// Make every subsequent save fail.
    pub fn fail_saves(&self) -> RenameResult<()> {
        *self.fail_saves.write().map_err(|_| Self::lock_error())? = true;
        Ok(())
    }

    pub fn len(&self) -> RenameResult<usize> {
        Ok(self.storage.read().map_err(|_| Self::lock_error())?.len())
    }

    pub fn is_empty(&self) -> RenameResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: &VmSnapshot) -> RenameResult<String> {
        if *self.fail_saves.read().map_err(|_| Self::lock_error())? {
            return Err(RenameError::Backup("snapshot store unavailable".to_string()));
        }

        let mut storage = self.storage.write().map_err(|_| Self::lock_error())?;
        let location = format!(
            "memory://{}/{}/{}",
            snapshot.resource_group,
            snapshot.source_name,
            storage.len()
        );
        storage.insert(location.clone(), snapshot.clone());
        Ok(location)
    }

    async fn load(&self, location: &str) -> RenameResult<VmSnapshot> {
        let storage = self.storage.read().map_err(|_| Self::lock_error())?;
        storage
            .get(location)
            .cloned()
            .ok_or_else(|| RenameError::Backup(format!("no snapshot at {location}")))
    }
}
