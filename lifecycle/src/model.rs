//! Host-owned records the lifecycle reads and, for asset metadata, writes.

use catalog::DataInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LifecycleError, Result};

/// Price type of pay-per-use price models.
pub const USAGE_PRICE_TYPE: &str = "usage";

/// A product asset exposing an NGSI API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    /// Public URL of the NGSI API.
    pub url: String,
    /// Principal that registered the asset. Catalog calls act on its behalf.
    pub provider: String,
    #[serde(default)]
    pub meta_info: AssetMetadata,
}

/// Mutable metadata attached to the asset.
///
/// Unknown keys are preserved so that a round trip through the lifecycle does
/// not drop fields the host or other plugins own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ckan_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetMetadata {
    /// The role granted to customers. Required at every checkpoint that uses it.
    pub fn role(&self) -> Result<&str> {
        self.role
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(LifecycleError::MissingMetadata("role"))
    }

    /// Catalog base URL, when dataset provisioning was requested.
    pub fn catalog_url(&self) -> Option<&str> {
        self.ckan_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Query-shaping fields for the dataset resource.
    pub fn data_info(&self) -> DataInfo {
        DataInfo {
            entities: self.entities.clone(),
            attrs: self.attrs.clone(),
            expression: self.expression.clone(),
            service: self.service.clone(),
            service_path: self.service_path.clone(),
        }
    }
}

/// A price component of a product offering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    #[serde(rename = "priceType")]
    pub price_type: String,
    #[serde(rename = "unitOfMeasure", default)]
    pub unit_of_measure: Option<String>,
}

impl PriceModel {
    pub fn is_usage(&self) -> bool {
        self.price_type.eq_ignore_ascii_case(USAGE_PRICE_TYPE)
    }
}

/// A product offering submitted for validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductOffering {
    /// Identifier used in the marketplace acquisition link.
    pub id: String,
    #[serde(rename = "productOfferingPrice", default)]
    pub prices: Vec<PriceModel>,
}

/// An order placed, cancelled or suspended by a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Principal receiving (or losing) access.
    pub customer: String,
    /// Organization on whose behalf the order was placed.
    #[serde(default)]
    pub owner_organization: Option<String>,
}

/// A pay-per-use accounting unit the backend can meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageUnit {
    pub name: String,
    pub description: String,
}
