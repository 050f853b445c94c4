//! Dataset provisioning in an external CKAN-style catalog.
//!
//! A product backed by an NGSI API can be mirrored as a catalog dataset so it
//! is discoverable outside the marketplace. The catalog is told three things:
//! that the dataset exists (create), where it can be bought (update of the
//! acquisition URL) and who bought it (acquisition notification, sent over a
//! mutually authenticated channel).

pub mod credentials;
pub mod dataset;
pub mod error;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};
use transport::{HttpRequest, HttpResponse, HttpTransport};

pub use credentials::{CredentialStore, StaticCredentials};
pub use dataset::{DataInfo, ProductInfo};
pub use error::{CatalogError, Result};

/// Catalog-side settings that do not depend on the asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Public base URL of the marketplace, used to build acquisition links.
    pub site_url: String,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

pub struct CatalogClient {
    config: CatalogConfig,
    transport: Arc<dyn HttpTransport>,
    notification_transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
}

impl CatalogClient {
    /// `notification_transport` must present the client certificate the
    /// catalog expects on acquisition notifications.
    pub fn new(
        config: CatalogConfig,
        transport: Arc<dyn HttpTransport>,
        notification_transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            notification_transport,
            credentials,
        }
    }

    fn action_url(catalog_url: &str, action: &str) -> String {
        format!(
            "{}/api/3/action/{}",
            catalog_url.trim_end_matches('/'),
            action
        )
    }

    /// Sends a catalog action on behalf of `principal` and returns its `result`.
    async fn call_action(
        &self,
        principal: &str,
        action: &'static str,
        request: HttpRequest,
    ) -> Result<Value> {
        let token = self.credentials.bearer_token(principal).await?;
        let response = self
            .transport
            .send(request.header("Authorization", format!("Bearer {}", token)))
            .await?;

        action_result(action, response)
    }

    /// Registers a dataset for `product` pointing at its NGSI entities query.
    ///
    /// Returns the catalog's id for the new dataset. Calling this twice for
    /// the same product creates two datasets unless the catalog rejects the
    /// duplicate name.
    pub async fn create_dataset(
        &self,
        principal: &str,
        catalog_url: &str,
        product: &ProductInfo,
        data_url: &str,
        info: &DataInfo,
    ) -> Result<String> {
        let name = dataset::dataset_name(&product.name);
        let mut resource = json!({
            "name": product.name,
            "url": dataset::entities_query_url(data_url, info),
            "format": dataset::NGSI_FORMAT,
        });
        if let Some(service) = info.service.as_deref().filter(|s| !s.is_empty()) {
            resource["fiware_service"] = json!(service);
        }
        if let Some(path) = info.service_path.as_deref().filter(|s| !s.is_empty()) {
            resource["fiware_service_path"] = json!(path);
        }

        let mut body = json!({
            "name": name,
            "title": product.name,
            "notes": product.description.clone().unwrap_or_default(),
            "resources": [resource],
        });
        if let Some(org) = &product.owner_organization {
            body["owner_org"] = json!(org);
        }

        debug!("Creating catalog dataset {} at {}", name, catalog_url);
        let request =
            HttpRequest::post(Self::action_url(catalog_url, "package_create")).json(body);
        let result = self.call_action(principal, "create", request).await?;

        let dataset_id = result
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::Provisioning {
                action: "create",
                message: "catalog response carries no dataset id".to_string(),
            })?;

        info!("Created catalog dataset {} ({})", name, dataset_id);
        Ok(dataset_id)
    }

    /// Points the dataset's acquisition link at the marketplace product page.
    pub async fn update_acquisition_url(
        &self,
        principal: &str,
        catalog_url: &str,
        dataset_id: &str,
        product_id: &str,
    ) -> Result<()> {
        let id = urlencoding::encode(dataset_id);

        let show = HttpRequest::post(format!(
            "{}?id={}",
            Self::action_url(catalog_url, "package_show"),
            id
        ));
        let mut record = self.call_action(principal, "show", show).await?;
        if !record.is_object() {
            return Err(CatalogError::Provisioning {
                action: "show",
                message: "catalog returned a non-object dataset record".to_string(),
            });
        }

        let acquire_url = dataset::acquisition_url(&self.config.site_url, product_id);
        record["acquire_url"] = json!(acquire_url);

        let update = HttpRequest::post(format!(
            "{}?id={}",
            Self::action_url(catalog_url, "package_update"),
            id
        ))
        .json(record);
        self.call_action(principal, "update", update).await?;

        info!(
            "Dataset {} acquisition URL set to {}",
            dataset_id, acquire_url
        );
        Ok(())
    }

    /// Tells the catalog that `customer_name` acquired the dataset.
    pub async fn notify_acquisition(
        &self,
        catalog_url: &str,
        dataset_id: &str,
        customer_name: &str,
    ) -> Result<()> {
        let base = catalog_url.trim_end_matches('/');
        let body = json!({
            "customer_name": customer_name,
            "resources": [{
                "url": format!("{}/dataset/{}", base, dataset_id),
            }],
        });

        self.notification_transport
            .send(HttpRequest::post(format!("{}/api/action/package_acquired", base)).json(body))
            .await?
            .error_for_status()?;

        info!(
            "Notified catalog of acquisition of {} by {}",
            dataset_id, customer_name
        );
        Ok(())
    }
}

/// Extracts `result` from a catalog action response.
fn action_result(action: &'static str, response: HttpResponse) -> Result<Value> {
    if !response.is_success() {
        error!(
            "Catalog {} call {} answered HTTP {}",
            action, response.url, response.status
        );
        return Err(CatalogError::Provisioning {
            action,
            message: format!("catalog answered HTTP {}", response.status),
        });
    }

    let body: ActionResponse = response.json()?;
    if body.success == Some(false) {
        let message = body
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "catalog reported failure".to_string());
        return Err(CatalogError::Provisioning { action, message });
    }

    Ok(body.result.unwrap_or(Value::Null))
}
