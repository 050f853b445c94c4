//! Seams the host marketplace plugs into the orchestrator.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{LifecycleError, Result};
use crate::model::Asset;

/// Persists asset metadata written by a checkpoint.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn save(&self, asset: &Asset) -> Result<()>;
}

/// Decides whether SpecAttachment may create a catalog dataset.
///
/// Dataset creation is not idempotent: attaching the same asset twice with a
/// catalog URL set creates two datasets. Hosts that can re-trigger the
/// attachment checkpoint can install [`SkipWhenProvisioned`].
pub trait ProvisioningGuard: Send + Sync {
    fn should_provision(&self, asset: &Asset) -> bool;
}

/// Creates a dataset every time a catalog URL is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysProvision;

impl ProvisioningGuard for AlwaysProvision {
    fn should_provision(&self, _asset: &Asset) -> bool {
        true
    }
}

/// Skips creation when the asset already records a dataset id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipWhenProvisioned;

impl ProvisioningGuard for SkipWhenProvisioned {
    fn should_provision(&self, asset: &Asset) -> bool {
        asset.meta_info.dataset_id().is_none()
    }
}

/// Keeps every saved revision in memory.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    saved: Mutex<Vec<Asset>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved revisions, oldest first.
    pub fn saved(&self) -> Vec<Asset> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn save(&self, asset: &Asset) -> Result<()> {
        self.saved
            .lock()
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?
            .push(asset.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards() {
        let mut asset = Asset::default();
        assert!(AlwaysProvision.should_provision(&asset));
        assert!(SkipWhenProvisioned.should_provision(&asset));

        asset.meta_info.dataset_id = Some("ds-1".to_string());
        assert!(AlwaysProvision.should_provision(&asset));
        assert!(!SkipWhenProvisioned.should_provision(&asset));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryAssetStore::new();
        let asset = Asset {
            id: "asset-1".to_string(),
            ..Asset::default()
        };
        store.save(&asset).await.unwrap();
        assert_eq!(store.saved(), vec![asset]);
    }
}
