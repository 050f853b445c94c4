//! Where catalog bearer tokens come from.
//!
//! The marketplace keeps each user's catalog API token in its profile store.
//! The lifecycle only ever asks for the token of one named principal right
//! before acting on that principal's behalf.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{CatalogError, Result};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Bearer token the catalog accepts for `principal`.
    async fn bearer_token(&self, principal: &str) -> Result<String>;
}

/// Fixed tokens, optionally with a fallback used for every unknown principal.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
    fallback: Option<String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, principal: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(principal.into(), token.into());
        self
    }

    pub fn with_fallback(mut self, token: impl Into<String>) -> Self {
        self.fallback = Some(token.into());
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn bearer_token(&self, principal: &str) -> Result<String> {
        self.tokens
            .get(principal)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CatalogError::Credentials(principal.to_string()))
    }
}
