use std::sync::Arc;
use transport::{HttpTransport, ReqwestTransport};

use crate::error::Result;
use crate::settings::Settings;

/// One transport per external authority.
#[derive(Clone)]
pub struct Transports {
    pub identity: Arc<dyn HttpTransport>,
    pub gateway: Arc<dyn HttpTransport>,
    pub catalog: Arc<dyn HttpTransport>,
    /// Presents the client certificate on catalog notifications.
    pub notification: Arc<dyn HttpTransport>,
}

impl Transports {
    /// reqwest transports honouring the TLS settings of each authority.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            identity: Arc::new(ReqwestTransport::new(&settings.identity_transport())?),
            gateway: Arc::new(ReqwestTransport::new(&settings.gateway_transport())?),
            catalog: Arc::new(ReqwestTransport::new(&settings.catalog_transport())?),
            notification: Arc::new(ReqwestTransport::new(&settings.notification_transport())?),
        })
    }

    /// The same transport for every authority.
    pub fn shared(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            identity: transport.clone(),
            gateway: transport.clone(),
            catalog: transport.clone(),
            notification: transport,
        }
    }

    pub fn with_notification(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.notification = transport;
        self
    }
}
