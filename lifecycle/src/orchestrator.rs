//! The lifecycle state machine.
//!
//! The host invokes one method per checkpoint, in this order over an asset's
//! life:
//!
//! 1. [`on_spec_validation`](LifecycleOrchestrator::on_spec_validation)
//! 2. [`on_spec_attachment`](LifecycleOrchestrator::on_spec_attachment)
//! 3. [`on_offering_validation`](LifecycleOrchestrator::on_offering_validation)
//! 4. [`on_acquisition`](LifecycleOrchestrator::on_acquisition), once per order
//! 5. [`on_suspension`](LifecycleOrchestrator::on_suspension), once per cancelled order
//!
//! The orchestrator keeps no state between checkpoints; everything it derives
//! is written to the asset metadata and handed to the [`AssetStore`]. Each
//! checkpoint runs until done or until the first failure, which is returned
//! as-is. Nothing is retried and completed sub-steps are not rolled back.

use catalog::{CatalogClient, CredentialStore, ProductInfo};
use gateway::GatewayClient;
use identity::IdentityClient;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LifecycleError, Result};
use crate::host::{AlwaysProvision, AssetStore, ProvisioningGuard};
use crate::model::{Asset, Order, ProductOffering, UsageUnit};
use crate::settings::Settings;
use crate::transports::Transports;

/// Named lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    SpecValidation,
    SpecAttachment,
    OfferingValidation,
    Acquisition,
    Suspension,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Checkpoint::SpecValidation => "spec-validation",
            Checkpoint::SpecAttachment => "spec-attachment",
            Checkpoint::OfferingValidation => "offering-validation",
            Checkpoint::Acquisition => "acquisition",
            Checkpoint::Suspension => "suspension",
        };
        f.write_str(name)
    }
}

pub struct LifecycleOrchestrator {
    settings: Settings,
    transports: Transports,
    credentials: Arc<dyn CredentialStore>,
    store: Arc<dyn AssetStore>,
    guard: Arc<dyn ProvisioningGuard>,
}

impl LifecycleOrchestrator {
    pub fn new(
        settings: Settings,
        transports: Transports,
        credentials: Arc<dyn CredentialStore>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            settings,
            transports,
            credentials,
            store,
            guard: Arc::new(AlwaysProvision),
        }
    }

    /// Replaces the dataset provisioning guard used at spec attachment.
    pub fn with_guard(mut self, guard: Arc<dyn ProvisioningGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Usage units the host may advertise for pay-per-use pricing.
    pub fn usage_specs(&self) -> &[UsageUnit] {
        &self.settings.units
    }

    fn gateway(&self) -> GatewayClient {
        GatewayClient::new(self.settings.gateway.clone(), self.transports.gateway.clone())
    }

    /// Logs in afresh; sessions are never shared between checkpoints.
    async fn identity(&self) -> Result<IdentityClient> {
        let client =
            IdentityClient::login(self.settings.identity.clone(), self.transports.identity.clone())
                .await?;
        Ok(client)
    }

    fn catalog(&self) -> CatalogClient {
        CatalogClient::new(
            self.settings.catalog.clone(),
            self.transports.catalog.clone(),
            self.transports.notification.clone(),
            self.credentials.clone(),
        )
    }

    /// Product specification submitted: the asset must be a gateway-published
    /// API, and when an identity application protects it the provider must
    /// own that application and the declared role must exist in it.
    ///
    /// Persists the resolved `app_id` (or its absence).
    pub async fn on_spec_validation(&self, provider: &str, asset: &mut Asset) -> Result<()> {
        info!(
            "[{}] asset {} by {}",
            Checkpoint::SpecValidation,
            asset.id,
            provider
        );
        let role = asset.meta_info.role()?.to_string();
        let path = url_path(&asset.url)?;

        let app_id = self.gateway().resolve_app_id(&path).await?;

        match &app_id {
            Some(app_id) => {
                let identity = self.identity().await?;
                identity.check_ownership(app_id, provider).await?;
                identity.resolve_role_id(app_id, &role).await?;
                debug!("Role {} verified in application {}", role, app_id);
            }
            None => info!(
                "Asset {} is not bound to an identity application; skipping ownership checks",
                asset.id
            ),
        }

        asset.meta_info.app_id = app_id;
        self.store.save(asset).await?;
        Ok(())
    }

    /// Specification attached to a product: create the catalog dataset when a
    /// catalog URL was given, and persist its id.
    pub async fn on_spec_attachment(&self, asset: &mut Asset, product: &ProductInfo) -> Result<()> {
        info!("[{}] asset {}", Checkpoint::SpecAttachment, asset.id);

        let Some(catalog_url) = asset.meta_info.catalog_url().map(str::to_string) else {
            debug!("No catalog URL for asset {}; nothing to provision", asset.id);
            return Ok(());
        };

        if !self.guard.should_provision(asset) {
            info!(
                "Provisioning guard skipped dataset creation for asset {}",
                asset.id
            );
            return Ok(());
        }
        if let Some(existing) = asset.meta_info.dataset_id() {
            warn!(
                "Asset {} already records dataset {}; creating another one",
                asset.id, existing
            );
        }

        let dataset_id = self
            .catalog()
            .create_dataset(
                &asset.provider,
                &catalog_url,
                product,
                &asset.url,
                &asset.meta_info.data_info(),
            )
            .await?;

        asset.meta_info.dataset_id = Some(dataset_id);
        self.store.save(asset).await?;
        Ok(())
    }

    /// Product offering submitted: every usage price must use a supported
    /// unit (first unsupported unit fails the checkpoint), then a provisioned
    /// dataset gets its acquisition link.
    pub async fn on_offering_validation(
        &self,
        asset: &Asset,
        offering: &ProductOffering,
    ) -> Result<()> {
        info!(
            "[{}] asset {} offering {}",
            Checkpoint::OfferingValidation,
            asset.id,
            offering.id
        );
        check_usage_units(offering, &self.settings.unit_names())?;

        if let Some(dataset_id) = asset.meta_info.dataset_id() {
            let catalog_url = asset
                .meta_info
                .catalog_url()
                .ok_or(LifecycleError::MissingMetadata("ckan_url"))?;
            self.catalog()
                .update_acquisition_url(&asset.provider, catalog_url, dataset_id, &offering.id)
                .await?;
        }
        Ok(())
    }

    /// Order placed: grant the asset role to the customer, then tell the
    /// catalog about the acquisition. Either failing rejects the order.
    pub async fn on_acquisition(&self, asset: &Asset, order: &Order) -> Result<()> {
        info!(
            "[{}] asset {} order {} customer {} ({:?})",
            Checkpoint::Acquisition,
            asset.id,
            order.id,
            order.customer,
            order.owner_organization
        );
        let role = asset.meta_info.role()?;

        match asset.meta_info.app_id() {
            Some(app_id) => {
                self.identity()
                    .await?
                    .grant_role(app_id, &order.customer, role)
                    .await?
            }
            None => info!(
                "Asset {} is not bound to an identity application; no role to grant",
                asset.id
            ),
        }

        if let Some(dataset_id) = asset.meta_info.dataset_id() {
            let catalog_url = asset
                .meta_info
                .catalog_url()
                .ok_or(LifecycleError::MissingMetadata("ckan_url"))?;
            self.catalog()
                .notify_acquisition(catalog_url, dataset_id, &order.customer)
                .await?;
        }
        Ok(())
    }

    /// Order cancelled or suspended: revoke the asset role from the customer.
    ///
    /// Catalog-side access is left untouched.
    pub async fn on_suspension(&self, asset: &Asset, order: &Order) -> Result<()> {
        info!(
            "[{}] asset {} order {} customer {}",
            Checkpoint::Suspension,
            asset.id,
            order.id,
            order.customer
        );
        let role = asset.meta_info.role()?;

        match asset.meta_info.app_id() {
            Some(app_id) => {
                self.identity()
                    .await?
                    .revoke_role(app_id, &order.customer, role)
                    .await?
            }
            None => info!(
                "Asset {} is not bound to an identity application; no role to revoke",
                asset.id
            ),
        }
        Ok(())
    }
}

/// Path component of an asset URL.
pub fn url_path(asset_url: &str) -> Result<String> {
    url::Url::parse(asset_url)
        .map(|parsed| parsed.path().to_string())
        .map_err(|e| LifecycleError::InvalidAssetUrl {
            url: asset_url.to_string(),
            message: e.to_string(),
        })
}

/// Fails on the first usage price whose unit is not in `supported`.
///
/// `supported` holds lower-cased unit names.
pub fn check_usage_units(offering: &ProductOffering, supported: &[String]) -> Result<()> {
    for price in offering.prices.iter().filter(|p| p.is_usage()) {
        let unit = price.unit_of_measure.clone().unwrap_or_default();
        if !supported.contains(&unit.to_lowercase()) {
            warn!("Offering {} uses unsupported unit {}", offering.id, unit);
            return Err(LifecycleError::UnsupportedUnit {
                unit,
                supported: supported.to_vec(),
            });
        }
    }
    Ok(())
}
