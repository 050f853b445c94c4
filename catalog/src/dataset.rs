//! Dataset naming and NGSI query URL construction.

use serde::{Deserialize, Serialize};

/// Path appended to an NGSI endpoint to list entities.
pub const ENTITIES_QUERY_PATH: &str = "/v2/entities";

/// Resource format advertised for NGSI data sources.
pub const NGSI_FORMAT: &str = "fiware-ngsi";

/// The marketplace product a dataset describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Catalog organization that will own the dataset.
    #[serde(default)]
    pub owner_organization: Option<String>,
}

/// Optional query-shaping fields taken from the asset metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataInfo {
    /// Entity type filter.
    #[serde(default)]
    pub entities: Option<String>,
    /// Comma separated attribute projection.
    #[serde(default)]
    pub attrs: Option<String>,
    /// Simple query language filter.
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub service_path: Option<String>,
}

/// Catalog-safe dataset name: lower-cased, spaces replaced with hyphens.
pub fn dataset_name(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "-")
}

/// Entities query URL for `data_url`, carrying the optional filters.
pub fn entities_query_url(data_url: &str, info: &DataInfo) -> String {
    let mut url = format!("{}{}", data_url.trim_end_matches('/'), ENTITIES_QUERY_PATH);

    let params: Vec<String> = [
        ("type", &info.entities),
        ("attrs", &info.attrs),
        ("q", &info.expression),
    ]
    .iter()
    .filter_map(|(key, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}={}", key, urlencoding::encode(v)))
    })
    .collect();

    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

/// Marketplace page where the product can be acquired.
pub fn acquisition_url(site_url: &str, product_id: &str) -> String {
    format!(
        "{}/#/offering/{}",
        site_url.trim_end_matches('/'),
        urlencoding::encode(product_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name() {
        assert_eq!(dataset_name("Parking Spots Madrid"), "parking-spots-madrid");
        assert_eq!(dataset_name("sensors"), "sensors");
    }

    #[test]
    fn test_entities_query_url_without_filters() {
        let url = entities_query_url("https://ngsi.example.org/a/b/", &DataInfo::default());
        assert_eq!(url, "https://ngsi.example.org/a/b/v2/entities");
    }

    #[test]
    fn test_entities_query_url_with_filters() {
        let info = DataInfo {
            entities: Some("ParkingSpot".to_string()),
            attrs: None,
            expression: Some("status==free".to_string()),
            ..DataInfo::default()
        };
        let url = entities_query_url("https://ngsi.example.org/a", &info);
        assert_eq!(
            url,
            "https://ngsi.example.org/a/v2/entities?type=ParkingSpot&q=status%3D%3Dfree"
        );
    }

    #[test]
    fn test_empty_filters_are_skipped() {
        let info = DataInfo {
            entities: Some(String::new()),
            attrs: Some("name,location".to_string()),
            ..DataInfo::default()
        };
        let url = entities_query_url("http://ngsi", &info);
        assert_eq!(url, "http://ngsi/v2/entities?attrs=name%2Clocation");
    }

    #[test]
    fn test_acquisition_url() {
        assert_eq!(
            acquisition_url("https://market.example.org/", "42"),
            "https://market.example.org/#/offering/42"
        );
    }
}
