//! reqwest-backed transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::{HttpRequest, HttpResponse, HttpTransport, Method};

/// Options used to build a [`ReqwestTransport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Verify the server certificate chain. Disabled only for self-signed lab setups.
    pub verify_tls: bool,
    /// PEM certificate presented to the server (mutual TLS).
    pub client_cert: Option<PathBuf>,
    /// PEM private key matching `client_cert`.
    pub client_key: Option<PathBuf>,
}

impl TransportOptions {
    pub fn verified() -> Self {
        Self {
            verify_tls: true,
            ..Self::default()
        }
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Present a client certificate on every connection.
    pub fn with_client_identity(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.client_cert = Some(cert.into());
        self.client_key = Some(key.into());
        self
    }
}

/// Production transport using a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if !options.verify_tls {
            warn!("TLS certificate verification is disabled for this transport");
            builder = builder.danger_accept_invalid_certs(true);
        }

        match (&options.client_cert, &options.client_key) {
            (Some(cert), Some(key)) => {
                builder = builder.identity(load_identity(cert, key)?);
            }
            (None, None) => {}
            _ => {
                return Err(TransportError::Client(
                    "Client certificate and key must be configured together".to_string(),
                ))
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

/// Reads a certificate/key pair into a single rustls identity.
fn load_identity(cert: &Path, key: &Path) -> Result<reqwest::Identity> {
    let mut pem = std::fs::read(cert).map_err(|e| {
        TransportError::Client(format!("Cannot read client certificate {:?}: {}", cert, e))
    })?;
    let key_pem = std::fs::read(key).map_err(|e| {
        TransportError::Client(format!("Cannot read client key {:?}: {}", key, e))
    })?;
    pem.push(b'\n');
    pem.extend_from_slice(&key_pem);

    reqwest::Identity::from_pem(&pem)
        .map_err(|e| TransportError::Client(format!("Invalid client identity: {}", e)))
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Connection {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?
            .to_vec();

        debug!("{} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse {
            method: request.method,
            url: request.url,
            status,
            headers,
            body,
        })
    }
}
