//! Device WebSocket endpoint derived from the page origin.

use std::fmt;
use url::Url;

/// Port the device firmware serves WebSocket on.
pub const DEVICE_WS_PORT: u16 = 81;

/// A `ws://` or `wss://` URL with the root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Derive the endpoint from the origin the control page was served from.
    ///
    /// `http` maps to `ws` and `https` to `wss`; `ws`/`wss` origins are kept.
    /// The host is kept, the port replaced, and path, query, fragment and
    /// credentials dropped. A bare host is treated as `http`.
    pub fn from_origin(origin: &str, port: u16) -> Result<Self, EndpointError> {
        let origin = origin.trim();
        let mut url = if origin.contains("://") {
            Url::parse(origin)?
        } else {
            Url::parse(&format!("http://{origin}"))?
        };

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };
        if url.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost(origin.to_string()));
        }

        url.set_scheme(scheme)
            .map_err(|()| EndpointError::UnsupportedScheme(scheme.to_string()))?;
        url.set_port(Some(port))
            .map_err(|()| EndpointError::MissingHost(origin.to_string()))?;
        // Only fails for cannot-be-a-base URLs, which have no host.
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error deriving an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid origin: {0}")]
    Parse(#[from] url::ParseError),
    #[error("unsupported origin scheme: {0}")]
    UnsupportedScheme(String),
    #[error("origin has no host: {0}")]
    MissingHost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_origin_maps_to_ws() {
        let ep = Endpoint::from_origin("http://192.168.4.1", DEVICE_WS_PORT).unwrap();
        assert_eq!(ep.as_str(), "ws://192.168.4.1:81/");
        assert!(!ep.is_secure());
    }

    #[test]
    fn https_origin_maps_to_wss() {
        let ep = Endpoint::from_origin("https://device.local:8443/index.html?x=1#top", 81).unwrap();
        assert_eq!(ep.as_str(), "wss://device.local:81/");
        assert!(ep.is_secure());
    }

    #[test]
    fn bare_host_defaults_to_ws() {
        let ep = Endpoint::from_origin("esp32.local", 81).unwrap();
        assert_eq!(ep.as_str(), "ws://esp32.local:81/");
    }

    #[test]
    fn ipv6_host_keeps_brackets() {
        let ep = Endpoint::from_origin("http://[::1]:8080", 81).unwrap();
        assert_eq!(ep.as_str(), "ws://[::1]:81/");
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            Endpoint::from_origin("ftp://device", 81),
            Err(EndpointError::UnsupportedScheme("ftp".to_string()))
        );
    }
}
