//! Error types for the HTTP transport layer.

use thiserror::Error;

/// Errors raised while talking to a remote HTTP service.
///
/// None of these are retried by the transport. Callers decide how a failure
/// is surfaced, but the default is to propagate it untouched.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote host could not be reached (DNS, refused connection, TLS handshake...).
    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// The remote host answered with a non-success status code.
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// The HTTP client itself could not be built (bad certificate, bad key...).
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl TransportError {
    /// Status code of the failed response, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote host was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
