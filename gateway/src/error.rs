//! Error types for the API gateway registry client.

use thiserror::Error;
use transport::TransportError;

/// Errors returned while resolving an asset against the gateway registry.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The asset URL does not correspond to any service published at the gateway.
    #[error("The provided asset is not supported. Only services protected by API Umbrella are supported")]
    UnsupportedAsset,

    /// The gateway could not be reached.
    #[error("Invalid resource: API Umbrella server is not responding")]
    Unreachable(#[source] TransportError),

    /// The gateway answered 404 for the listing endpoint.
    #[error("The provided Umbrella resource does not exist")]
    ResourceNotFound(#[source] TransportError),

    /// Any other failure talking to the gateway.
    #[error("Umbrella gives an error accessing the provided resource")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        if err.is_connection() {
            GatewayError::Unreachable(err)
        } else if err.status() == Some(404) {
            GatewayError::ResourceNotFound(err)
        } else {
            GatewayError::Transport(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
