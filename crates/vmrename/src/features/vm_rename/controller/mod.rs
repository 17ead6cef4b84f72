use crate::features::vm_rename::service::RenameService;
use crate::shared::types::{RenameReport, RenameRequest, RestoreRequest};
use std::sync::Arc;
use tracing::info;

/// Entry point used by the CLI for rename and restore runs
pub struct RenameController {
    service: Arc<RenameService>,
}

impl RenameController {
    pub fn new(service: Arc<RenameService>) -> Self {
        Self { service }
    }

    /// Handle rename request
    /// Thin wrapper that delegates to service
    pub async fn rename(
        &self,
        request: RenameRequest,
    ) -> Result<RenameReport, vmrename_core::ErrorResponse> {
        info!(
            resource_group = %request.resource_group,
            old_name = %request.old_name,
            new_name = %request.new_name,
            dry_run = request.dry_run,
            "Received rename request"
        );

        self.service.rename(request).await.map_err(|e| e.into())
    }

    /// Handle restore request
    pub async fn restore(
        &self,
        request: RestoreRequest,
    ) -> Result<RenameReport, vmrename_core::ErrorResponse> {
        info!(snapshot = %request.snapshot_location, "Received restore request");

        self.service.restore(request).await.map_err(|e| e.into())
    }
}
