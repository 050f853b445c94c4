//! Error types for the identity authority client.
//!
//! # Security Note
//! Credentials and session tokens never appear in these messages. Principal
//! and application identifiers do, since they are needed to act on a
//! rejected lifecycle transition.

use thiserror::Error;
use transport::TransportError;

/// Errors that can occur while talking to the identity authority.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The configured service credentials were rejected.
    ///
    /// No retry is attempted; the client cannot be constructed.
    #[error("Identity authority login failed: {0}")]
    Authentication(#[source] TransportError),

    /// Login succeeded but the response carried no session token header.
    #[error("Identity authority did not return a session token")]
    MissingToken,

    /// The principal holds no provider assignment on the application.
    #[error("You are not the owner of the specified IDM application")]
    NotOwner { app_id: String, principal: String },

    /// The role name is not registered in the application.
    #[error("The provided role '{role}' is not registered in keystone. Available roles: {}", available.join(", "))]
    UnknownRole { role: String, available: Vec<String> },

    /// Any other failure of an authenticated call, including a 401 from an
    /// expired session.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A specialized Result type for identity authority operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
