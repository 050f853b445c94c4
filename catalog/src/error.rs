//! Error types for the dataset catalog client.

use thiserror::Error;
use transport::TransportError;

/// Errors raised while provisioning or notifying the external catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog refused a create, show or update call.
    #[error("Dataset {action} failed: {message}")]
    Provisioning {
        action: &'static str,
        message: String,
    },

    /// No catalog credential could be obtained for the acting principal.
    #[error("No catalog credentials for {0}")]
    Credentials(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
