use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use colored::*;
use lifecycle::{
    Asset, AssetStore, Checkpoint, LifecycleError, LifecycleOrchestrator, Order, ProductInfo,
    ProductOffering, Settings, SkipWhenProvisioned, StaticCredentials, Transports,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Catalog API token used for every provider.
pub const CATALOG_TOKEN_ENV: &str = "BAE_ASSET_CKAN_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckpointArg {
    SpecValidation,
    SpecAttachment,
    OfferingValidation,
    Acquisition,
    Suspension,
}

impl From<CheckpointArg> for Checkpoint {
    fn from(arg: CheckpointArg) -> Self {
        match arg {
            CheckpointArg::SpecValidation => Checkpoint::SpecValidation,
            CheckpointArg::SpecAttachment => Checkpoint::SpecAttachment,
            CheckpointArg::OfferingValidation => Checkpoint::OfferingValidation,
            CheckpointArg::Acquisition => Checkpoint::Acquisition,
            CheckpointArg::Suspension => Checkpoint::Suspension,
        }
    }
}

/// Record files handed to a checkpoint run.
#[derive(Debug, Clone)]
pub struct CheckpointInputs {
    pub asset: PathBuf,
    pub provider: Option<String>,
    pub product: Option<PathBuf>,
    pub offering: Option<PathBuf>,
    pub order: Option<PathBuf>,
    pub skip_provisioned: bool,
}

/// Writes the asset back to the JSON file it was read from.
pub struct FileAssetStore {
    path: PathBuf,
}

impl FileAssetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    async fn save(&self, asset: &Asset) -> lifecycle::Result<()> {
        let content = serde_json::to_string_pretty(asset)
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| {
                LifecycleError::Persistence(format!("{}: {}", self.path.display(), e))
            })?;
        debug!("Saved asset {} to {:?}", asset.id, self.path);
        Ok(())
    }
}

/// Run one checkpoint against the asset file
pub async fn execute(settings: Settings, arg: CheckpointArg, inputs: CheckpointInputs) -> Result<()> {
    let checkpoint = Checkpoint::from(arg);
    let mut asset: Asset = read_json(&inputs.asset)?;

    let mut credentials = StaticCredentials::new();
    if let Ok(token) = std::env::var(CATALOG_TOKEN_ENV) {
        credentials = credentials.with_fallback(token);
    }

    let transports = Transports::from_settings(&settings)?;
    let mut orchestrator = LifecycleOrchestrator::new(
        settings,
        transports,
        Arc::new(credentials),
        Arc::new(FileAssetStore::new(&inputs.asset)),
    );
    if inputs.skip_provisioned {
        orchestrator = orchestrator.with_guard(Arc::new(SkipWhenProvisioned));
    }

    let outcome = match checkpoint {
        Checkpoint::SpecValidation => {
            let provider = inputs
                .provider
                .clone()
                .unwrap_or_else(|| asset.provider.clone());
            orchestrator.on_spec_validation(&provider, &mut asset).await
        }
        Checkpoint::SpecAttachment => {
            let product: ProductInfo = read_required(&inputs.product, "--product", checkpoint)?;
            orchestrator.on_spec_attachment(&mut asset, &product).await
        }
        Checkpoint::OfferingValidation => {
            let offering: ProductOffering =
                read_required(&inputs.offering, "--offering", checkpoint)?;
            orchestrator.on_offering_validation(&asset, &offering).await
        }
        Checkpoint::Acquisition => {
            let order: Order = read_required(&inputs.order, "--order", checkpoint)?;
            orchestrator.on_acquisition(&asset, &order).await
        }
        Checkpoint::Suspension => {
            let order: Order = read_required(&inputs.order, "--order", checkpoint)?;
            orchestrator.on_suspension(&asset, &order).await
        }
    };

    match outcome {
        Ok(()) => {
            println!("{} {} passed for asset {}", "✓".green(), checkpoint, asset.id.bold());
            if let Some(app_id) = asset.meta_info.app_id() {
                println!("  Application: {}", app_id);
            }
            if let Some(dataset_id) = asset.meta_info.dataset_id() {
                println!("  Dataset: {}", dataset_id);
            }
            Ok(())
        }
        Err(e) => {
            report_rejection(checkpoint, &e);
            Err(anyhow!(e))
        }
    }
}

fn report_rejection(checkpoint: Checkpoint, error: &LifecycleError) {
    let verdict = if error.is_permission_denied() {
        "permission denied"
    } else {
        "rejected"
    };
    eprintln!(
        "{} {} {} ({:?})",
        "✗".red(),
        checkpoint,
        verdict.red().bold(),
        error.kind()
    );
    if let Some(alternatives) = error.valid_alternatives() {
        eprintln!("  Valid values: {}", alternatives.join(", "));
    }
}

fn read_required<T: DeserializeOwned>(
    path: &Option<PathBuf>,
    flag: &str,
    checkpoint: Checkpoint,
) -> Result<T> {
    let path = path
        .as_deref()
        .ok_or_else(|| anyhow!("{} is required for {}", flag, checkpoint))?;
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
