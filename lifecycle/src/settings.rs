//! Plugin settings.
//!
//! Settings are resolved in three layers: built-in defaults, an optional YAML
//! file, then `BAE_ASSET_*` environment variables. Loading a `.env` file is
//! left to the binary.

use catalog::CatalogConfig;
use gateway::GatewayConfig;
use identity::IdentityConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use transport::TransportOptions;

use crate::model::UsageUnit;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Cannot read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid settings: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub identity: IdentityConfig,
    pub gateway: GatewayConfig,
    pub catalog: CatalogConfig,
    /// Verify TLS certificates of the identity authority and the catalog.
    pub verify_requests: bool,
    /// Verify TLS certificates of the gateway admin API.
    pub gateway_verify_tls: bool,
    /// Client certificate presented on catalog acquisition notifications.
    pub notification_cert: Option<PathBuf>,
    pub notification_key: Option<PathBuf>,
    /// Pay-per-use units the backend can meter.
    pub units: Vec<UsageUnit>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity: IdentityConfig {
                url: "http://idm.docker:5000".to_string(),
                user: "idm".to_string(),
                password: "idm".to_string(),
            },
            gateway: GatewayConfig::default(),
            catalog: CatalogConfig {
                site_url: "http://localhost:8004".to_string(),
            },
            verify_requests: true,
            gateway_verify_tls: false,
            notification_cert: None,
            notification_key: None,
            units: vec![UsageUnit {
                name: "Api call".to_string(),
                description:
                    "The final price is calculated based on the number of calls made to the API"
                        .to_string(),
            }],
        }
    }
}

impl Settings {
    /// Defaults, overlaid with `path` when given, overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded settings file {:?}", path);
        Self::from_yaml(&content)
    }

    /// Parses `content` as an overlay on the built-in defaults.
    ///
    /// Mappings merge key by key at every depth, so a partial section keeps
    /// the defaults of the keys it omits. Any other value, lists included,
    /// replaces the default outright.
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        let overlay: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mut merged = serde_yaml::to_value(Self::default())?;
        merge_yaml(&mut merged, overlay);
        Ok(serde_yaml::from_value(merged)?)
    }

    /// Applies `BAE_ASSET_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 7] = [
            ("BAE_ASSET_IDM_USER", &mut self.identity.user),
            ("BAE_ASSET_IDM_PASSWORD", &mut self.identity.password),
            ("BAE_ASSET_IDM_URL", &mut self.identity.url),
            ("BAE_ASSET_UMBRELLA_URL", &mut self.gateway.url),
            ("BAE_ASSET_UMBRELLA_KEY", &mut self.gateway.api_key),
            ("BAE_ASSET_UMBRELLA_TOKEN", &mut self.gateway.admin_token),
            ("BAE_ASSET_SITE", &mut self.catalog.site_url),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(value) = lookup("BAE_ASSET_VERIFY_REQUESTS") {
            self.verify_requests = parse_flag(&value);
        }
        if let Some(value) = lookup("BAE_ASSET_NOTIF_CERT_FILE") {
            self.notification_cert = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("BAE_ASSET_NOTIF_CERT_KEY_FILE") {
            self.notification_key = Some(PathBuf::from(value));
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.identity.url.is_empty() {
            return Err(SettingsError::Validation(
                "identity authority URL cannot be empty".to_string(),
            ));
        }
        if self.units.is_empty() {
            return Err(SettingsError::Validation(
                "at least one usage unit must be configured".to_string(),
            ));
        }
        if self.notification_cert.is_some() != self.notification_key.is_some() {
            return Err(SettingsError::Validation(
                "notification certificate and key must be configured together".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with secrets masked, safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.identity.password = mask(&copy.identity.password);
        copy.gateway.api_key = mask(&copy.gateway.api_key);
        copy.gateway.admin_token = mask(&copy.gateway.admin_token);
        copy
    }

    /// Lower-cased names of the supported usage units.
    pub fn unit_names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name.to_lowercase()).collect()
    }

    pub fn identity_transport(&self) -> TransportOptions {
        TransportOptions::default().with_verify_tls(self.verify_requests)
    }

    pub fn gateway_transport(&self) -> TransportOptions {
        TransportOptions::default().with_verify_tls(self.gateway_verify_tls)
    }

    pub fn catalog_transport(&self) -> TransportOptions {
        TransportOptions::default().with_verify_tls(self.verify_requests)
    }

    pub fn notification_transport(&self) -> TransportOptions {
        let options = self.catalog_transport();
        match (&self.notification_cert, &self.notification_key) {
            (Some(cert), Some(key)) => options.with_client_identity(cert, key),
            _ => options,
        }
    }
}

fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (_, serde_yaml::Value::Null) => {}
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_yaml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.identity.url, "http://idm.docker:5000");
        assert_eq!(settings.unit_names(), vec!["api call"]);
        assert!(settings.verify_requests);
        assert!(!settings.gateway_verify_tls);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BAE_ASSET_IDM_URL", "https://idm.example.org"),
            ("BAE_ASSET_IDM_PASSWORD", "s3cret"),
            ("BAE_ASSET_UMBRELLA_URL", "https://umbrella.example.org"),
            ("BAE_ASSET_VERIFY_REQUESTS", "False"),
            ("BAE_ASSET_NOTIF_CERT_FILE", "/certs/client.crt"),
            ("BAE_ASSET_NOTIF_CERT_KEY_FILE", "/certs/client.key"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.identity.url, "https://idm.example.org");
        assert_eq!(settings.identity.user, "idm");
        assert_eq!(settings.identity.password, "s3cret");
        assert_eq!(settings.gateway.url, "https://umbrella.example.org");
        assert!(!settings.verify_requests);

        let notification = settings.notification_transport();
        assert_eq!(notification.client_cert, Some(PathBuf::from("/certs/client.crt")));
        assert!(!notification.verify_tls);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml(
            r#"
identity:
  url: https://idm.example.org
units:
  - name: Hour
    description: Billed per hour of access
  - name: Api call
    description: Billed per call
"#,
        )
        .unwrap();

        assert_eq!(settings.identity.url, "https://idm.example.org");
        assert_eq!(settings.identity.user, "idm");
        assert_eq!(settings.identity.password, "idm");
        assert_eq!(settings.unit_names(), vec!["hour", "api call"]);
        assert_eq!(settings.catalog.site_url, "http://localhost:8004");
        assert!(settings.verify_requests);
    }

    #[test]
    fn test_partial_sections_keep_nested_defaults() {
        let settings = Settings::from_yaml("catalog: {}\nidentity:\n  user: bae\n").unwrap();
        assert_eq!(settings.catalog.site_url, "http://localhost:8004");
        assert_eq!(settings.identity.user, "bae");
        assert_eq!(settings.identity.url, "http://idm.docker:5000");
        assert_eq!(settings.identity.password, "idm");

        let settings = Settings::from_yaml("gateway_verify_tls: true\n").unwrap();
        assert!(settings.gateway_verify_tls);
        assert_eq!(settings.units, Settings::default().units);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gateway:\n  url: http://umbrella\n  api_key: k").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.gateway.url, "http://umbrella");
        assert_eq!(settings.gateway.api_key, "k");

        let missing = Settings::from_file(Path::new("/nonexistent/settings.yaml"));
        assert!(matches!(missing, Err(SettingsError::Io { .. })));
    }

    #[test]
    fn test_validation() {
        let settings = Settings {
            units: Vec::new(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            notification_cert: Some(PathBuf::from("client.crt")),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_redacted() {
        let mut settings = Settings::default();
        settings.gateway.api_key = "key".to_string();
        let redacted = settings.redacted();

        assert_eq!(redacted.identity.password, "********");
        assert_eq!(redacted.gateway.api_key, "********");
        assert_eq!(redacted.gateway.admin_token, "");
        assert_eq!(redacted.identity.user, "idm");
    }
}
