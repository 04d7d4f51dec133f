//! Client configuration, loadable from TOML.

use devlink_core::{DEVICE_WS_PORT, Endpoint, EndpointError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default reconnect delay. Fixed; it never grows between attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// How to reach the device and how the client behaves.
///
/// ```toml
/// origin = "http://192.168.4.1"
/// port = 81
/// retry_delay_ms = 2000
/// request_status_on_open = true
/// auto_scroll = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin the control page is served from; the endpoint is derived from it.
    pub origin: String,
    /// WebSocket port on the device.
    pub port: u16,
    pub retry_delay_ms: u64,
    /// Send `GET_STATUS` as soon as a link opens.
    pub request_status_on_open: bool,
    /// Initial auto-scroll preference for the message log.
    pub auto_scroll: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://192.168.4.1".to_string(),
            port: DEVICE_WS_PORT,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            request_status_on_open: true,
            auto_scroll: true,
        }
    }
}

impl ClientConfig {
    /// Read a TOML file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn endpoint(&self) -> Result<Endpoint, EndpointError> {
        Endpoint::from_origin(&self.origin, self.port)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Error loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert!(config.request_status_on_open);
        assert_eq!(config.endpoint().unwrap().as_str(), "ws://192.168.4.1:81/");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            origin = "https://esp32.local"
            request_status_on_open = false
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 81);
        assert_eq!(config.retry_delay_ms, 2_000);
        assert!(!config.request_status_on_open);
        assert_eq!(config.endpoint().unwrap().as_str(), "wss://esp32.local:81/");
    }

    #[test]
    fn rejects_wrong_types() {
        let err = ClientConfig::from_toml_str("port = \"eighty-one\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let err = ClientConfig::load("/nonexistent/devlink.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/devlink.toml"));
    }
}
