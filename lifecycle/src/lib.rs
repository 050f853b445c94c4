//! Lifecycle orchestration for marketplace assets backed by NGSI APIs.
//!
//! At each checkpoint of a product's life the orchestrator checks the asset
//! against the API gateway registry and the identity authority, provisions a
//! dataset in the external catalog, and grants or revokes customer access.
//! See [`orchestrator`] for the checkpoint sequence.

pub mod error;
pub mod host;
pub mod model;
pub mod orchestrator;
pub mod settings;
pub mod transports;

pub use catalog::{CredentialStore, ProductInfo, StaticCredentials};
pub use error::{ErrorKind, LifecycleError, Result};
pub use host::{AlwaysProvision, AssetStore, InMemoryAssetStore, ProvisioningGuard, SkipWhenProvisioned};
pub use model::{Asset, AssetMetadata, Order, PriceModel, ProductOffering, UsageUnit};
pub use orchestrator::{Checkpoint, LifecycleOrchestrator};
pub use settings::{Settings, SettingsError};
pub use transports::Transports;
