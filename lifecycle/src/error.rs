//! Error taxonomy for lifecycle checkpoints.
//!
//! Every failure of a checkpoint is a rejection of that lifecycle transition.
//! [`ErrorKind`] tells the host how to present it: permission problems are
//! shown as such, configuration problems carry the valid alternatives, and
//! transport problems are reported as upstream failures.

use catalog::CatalogError;
use gateway::error::GatewayError;
use identity::IdentityError;
use thiserror::Error;
use transport::TransportError;

use crate::settings::SettingsError;

/// Broad classes of checkpoint failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connectivity or non-success HTTP from an external authority.
    Transport,
    /// The asset does not map to a service published at the gateway.
    UnsupportedAsset,
    /// The service credentials were rejected by the identity authority.
    Authentication,
    /// The principal lacks the required ownership or role.
    Authorization,
    /// A role, usage unit or metadata field is not recognised.
    Configuration,
    /// The catalog refused to create or update a dataset.
    Provisioning,
    /// The host failed to persist asset metadata.
    Host,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Asset metadata is missing required field '{0}'")]
    MissingMetadata(&'static str),

    #[error("Invalid asset URL {url}: {message}")]
    InvalidAssetUrl { url: String, message: String },

    #[error("Unsupported accounting unit {unit}. Supported units are: {}", supported.join(","))]
    UnsupportedUnit { unit: String, supported: Vec<String> },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Asset persistence failed: {0}")]
    Persistence(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::MissingMetadata(_) => ErrorKind::Configuration,
            LifecycleError::InvalidAssetUrl { .. } => ErrorKind::UnsupportedAsset,
            LifecycleError::UnsupportedUnit { .. } => ErrorKind::Configuration,
            LifecycleError::Gateway(GatewayError::UnsupportedAsset) => ErrorKind::UnsupportedAsset,
            LifecycleError::Gateway(_) => ErrorKind::Transport,
            LifecycleError::Identity(err) => match err {
                IdentityError::Authentication(_) | IdentityError::MissingToken => {
                    ErrorKind::Authentication
                }
                IdentityError::NotOwner { .. } => ErrorKind::Authorization,
                IdentityError::UnknownRole { .. } => ErrorKind::Configuration,
                IdentityError::Transport(_) => ErrorKind::Transport,
            },
            LifecycleError::Catalog(err) => match err {
                CatalogError::Provisioning { .. } | CatalogError::Credentials(_) => {
                    ErrorKind::Provisioning
                }
                CatalogError::Transport(_) => ErrorKind::Transport,
            },
            LifecycleError::Transport(_) => ErrorKind::Transport,
            LifecycleError::Persistence(_) => ErrorKind::Host,
            LifecycleError::Settings(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the host should present this as a permission-denied rejection.
    pub fn is_permission_denied(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }

    /// Accepted values, when the failure is an unrecognised name.
    pub fn valid_alternatives(&self) -> Option<&[String]> {
        match self {
            LifecycleError::UnsupportedUnit { supported, .. } => Some(supported.as_slice()),
            LifecycleError::Identity(IdentityError::UnknownRole { available, .. }) => {
                Some(available.as_slice())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
