//! Client for the API gateway registry (API Umbrella admin API).
//!
//! The only question the lifecycle asks the gateway is "which identity
//! application protects the service published under this URL path?". The
//! answer is found by walking the registered API backends with a substring
//! hint and checking each backend's frontend prefix against the asset path.

pub mod error;
pub mod paginate;
pub mod prefix;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use transport::HttpTransport;

use error::{GatewayError, Result};
use paginate::{PaginationError, Paginator, DEFAULT_PAGE_SIZE};
use prefix::{prefix_matches, split_path};

const APIS_PATH: &str = "/api-umbrella/v1/apis.json";

/// Connection settings for the gateway admin API.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    /// Admin API key, sent as `X-Api-Key`.
    pub api_key: String,
    /// Admin token, sent as `X-Admin-Auth-Token`.
    pub admin_token: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("admin_token", &"***")
            .finish()
    }
}

/// A registered API backend, as listed by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiBackend {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub frontend_prefixes: String,
    #[serde(default)]
    pub settings: Option<ApiSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiSettings {
    /// Identity application whose tokens the gateway accepts for this API.
    #[serde(default)]
    pub idp_app_id: Option<String>,
}

impl ApiBackend {
    /// The bound identity application, ignoring empty values.
    pub fn idp_app_id(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| s.idp_app_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

pub struct GatewayClient {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Finds the backend serving `url_path`.
    ///
    /// Fails with [`GatewayError::UnsupportedAsset`] for a bare root path or
    /// when no registered prefix covers the path.
    pub async fn find_backend(&self, url_path: &str) -> Result<ApiBackend> {
        let paths = split_path(url_path);
        let Some(hint) = paths.first() else {
            return Err(GatewayError::UnsupportedAsset);
        };

        // The hint narrows the listing server-side; the prefix check below is authoritative
        let base_query = format!(
            "{}{}?search[value]={}&search[regex]=false",
            self.config.url.trim_end_matches('/'),
            APIS_PATH,
            urlencoding::encode(hint)
        );

        let paginator = Paginator::new(self.transport.as_ref())
            .with_header("X-Api-Key", self.config.api_key.clone())
            .with_header("X-Admin-Auth-Token", self.config.admin_token.clone());

        let backend = paginator
            .find(&base_query, DEFAULT_PAGE_SIZE, |api: &ApiBackend| {
                prefix_matches(&api.frontend_prefixes, &paths)
            })
            .await
            .map_err(|e| match e {
                PaginationError::Exhausted { pages_fetched } => {
                    debug!(
                        "No gateway prefix covers {} after {} page(s)",
                        url_path, pages_fetched
                    );
                    GatewayError::UnsupportedAsset
                }
                PaginationError::Transport(err) => GatewayError::from(err),
            })?;

        debug!(
            "Path {} matched gateway backend {:?} ({})",
            url_path, backend.name, backend.frontend_prefixes
        );
        Ok(backend)
    }

    /// Resolves the identity application bound to the service at `url_path`.
    ///
    /// `Ok(None)` means the service is published at the gateway without an
    /// identity application, so no authorization is required for it.
    pub async fn resolve_app_id(&self, url_path: &str) -> Result<Option<String>> {
        let backend = self.find_backend(url_path).await?;
        let app_id = backend.idp_app_id().map(str::to_string);

        match &app_id {
            Some(id) => info!("Asset path {} is protected by application {}", url_path, id),
            None => info!("Asset path {} is not bound to an identity application", url_path),
        }
        Ok(app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use transport::mock::MockTransport;
    use transport::{HttpResponse, Method};

    fn client(transport: Arc<MockTransport>) -> GatewayClient {
        GatewayClient::new(
            GatewayConfig {
                url: "http://umbrella/".to_string(),
                api_key: "key".to_string(),
                admin_token: "admin".to_string(),
            },
            transport,
        )
    }

    fn backends(list: serde_json::Value) -> HttpResponse {
        HttpResponse::json_body(200, json!({ "data": list }))
    }

    #[tokio::test]
    async fn test_resolve_app_id_on_prefix_match() {
        let transport = Arc::new(
            MockTransport::new()
                .route(
                    Method::Get,
                    "start=0&",
                    backends(json!([
                        {"frontend_prefixes": "/a/x", "settings": {"idp_app_id": "other"}},
                        {"frontend_prefixes": "/a/b", "settings": {"idp_app_id": "app1"}}
                    ])),
                )
                .route(Method::Get, "apis.json", backends(json!([]))),
        );

        let app_id = client(transport.clone()).resolve_app_id("/a/b/c").await.unwrap();
        assert_eq!(app_id, Some("app1".to_string()));

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "http://umbrella/api-umbrella/v1/apis.json?search[value]=a&search[regex]=false&start=0&length=100"
        );
        assert_eq!(request.header_value("X-Api-Key"), Some("key"));
        assert_eq!(request.header_value("X-Admin-Auth-Token"), Some("admin"));
    }

    #[tokio::test]
    async fn test_unbound_backend_resolves_to_none() {
        let transport = Arc::new(
            MockTransport::new()
                .route(
                    Method::Get,
                    "start=0&",
                    backends(json!([
                        {"frontend_prefixes": "/a", "settings": {"idp_app_id": ""}}
                    ])),
                ),
        );

        let app_id = client(transport).resolve_app_id("/a/b").await.unwrap();
        assert_eq!(app_id, None);
    }

    #[tokio::test]
    async fn test_root_path_is_unsupported_without_network() {
        let transport = Arc::new(MockTransport::new());
        let err = client(transport.clone()).resolve_app_id("/").await.unwrap_err();

        assert!(matches!(err, GatewayError::UnsupportedAsset));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_longer_prefix_never_matches() {
        let transport = Arc::new(
            MockTransport::new()
                .route(
                    Method::Get,
                    "start=0&",
                    backends(json!([{"frontend_prefixes": "/a/b", "settings": {"idp_app_id": "app1"}}])),
                )
                .route(Method::Get, "start=100&", backends(json!([]))),
        );

        let err = client(transport.clone()).resolve_app_id("/a").await.unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedAsset));
        assert_eq!(transport.count(Method::Get, "apis.json"), 2);
    }

    #[tokio::test]
    async fn test_gateway_down() {
        let transport = Arc::new(MockTransport::new().unreachable(Method::Get, "apis.json"));
        let err = client(transport).resolve_app_id("/a/b").await.unwrap_err();
        assert!(matches!(err, GatewayError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_gateway_listing_missing() {
        let transport = Arc::new(MockTransport::new());
        let err = client(transport).resolve_app_id("/a/b").await.unwrap_err();
        assert!(matches!(err, GatewayError::ResourceNotFound(_)));
    }
}
