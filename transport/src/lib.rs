//! Verb-based HTTP plumbing shared by the identity, gateway and catalog clients.
//!
//! Every remote authority is reached through the [`HttpTransport`] trait so the
//! clients can be driven by the reqwest implementation in production and by a
//! scripted transport in tests. A transport only moves bytes: it never retries,
//! never refreshes credentials and never interprets status codes. Turning a
//! non-success status into an error is left to the caller through
//! [`HttpResponse::error_for_status`].

pub mod client;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;

pub use client::{ReqwestTransport, TransportOptions};
pub use error::{Result, TransportError};

/// HTTP verbs used by the lifecycle clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Adds a header. Later headers with the same name are sent as well.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response received from a remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub method: Method,
    pub url: String,
    pub status: u16,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Builds a response with no headers and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            method: Method::Get,
            url: String::new(),
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Builds a response carrying a JSON document.
    pub fn json_body(status: u16, body: serde_json::Value) -> Self {
        let mut response = Self::new(status).with_header("content-type", "application/json");
        response.body = body.to_string().into_bytes();
        response
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Records which request produced this response.
    pub fn for_request(mut self, method: Method, url: impl Into<String>) -> Self {
        self.method = method;
        self.url = url.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TransportError::Decode(format!("{} {}: {}", self.method, self.url, e))
        })
    }

    /// Returns the response unchanged on 2xx, or a [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                method: self.method.to_string(),
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// A request/response channel to a remote service.
///
/// One call is one round trip. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::post("http://idm/v3/auth/tokens")
            .header("X-Auth-Token", "abc")
            .json(json!({"name": "idm"}));

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header_value("x-auth-token"), Some("abc"));
        assert_eq!(request.body, Some(json!({"name": "idm"})));
        assert_eq!(request.method.to_string(), "POST");
    }

    #[test]
    fn test_method_verbs() {
        let verbs: Vec<String> = [Method::Get, Method::Post, Method::Delete]
            .iter()
            .map(Method::to_string)
            .collect();
        assert_eq!(verbs, vec!["GET", "POST", "DELETE"]);
    }

    #[test]
    fn test_response_headers_are_case_insensitive() {
        let response = HttpResponse::new(201).with_header("X-Subject-Token", "tok");
        assert_eq!(response.header("x-subject-token"), Some("tok"));
        assert_eq!(response.header("X-SUBJECT-TOKEN"), Some("tok"));
        assert!(response.is_success());
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse::new(204).for_request(Method::Delete, "http://idm/x");
        assert!(ok.error_for_status().is_ok());

        let err = HttpResponse::new(404)
            .for_request(Method::Get, "http://umbrella/apis.json")
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "GET http://umbrella/apis.json returned HTTP 404"
        );
    }

    #[test]
    fn test_json_decode_error() {
        let response = HttpResponse::new(200).for_request(Method::Get, "http://ckan");
        let decoded: Result<serde_json::Value> = response.json();
        assert!(matches!(decoded, Err(TransportError::Decode(_))));
    }
}
