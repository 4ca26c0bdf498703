//! # Configuration
//!
//! Grounded on `examples/original_source/config/config.go`'s `Config`
//! (`AppConfig`/`AuthConfig`/`APIConfig`, the default values, and the
//! try-each-path-then-fall-back-to-defaults loading strategy), ported from
//! hand-rolled line scanning + `lazy_static` to `serde` + `toml`, the pack's
//! standard config-loading idiom.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RelayError, Result};

/// Top-level configuration tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen addresses, e.g. `"0.0.0.0:1337"`.
    pub addresses: Vec<String>,
    /// Address advertised to clients in statistics URLs, guessed from the
    /// first listen address if left empty.
    pub public_address: String,
    /// SRT latency in milliseconds.
    pub latency_ms: u32,
    /// Total per-subscriber buffer size in bytes; determines the maximum
    /// delay a client can tolerate before being dropped as slow.
    pub buffer_size: usize,
    /// Whether a late-joining subscriber waits for a clean sync point
    /// before receiving data.
    pub sync_clients: bool,
    /// Upper bound the SRT reorder tolerance may grow to; 0 disables growth.
    pub loss_max_ttl: u32,
    /// Maximum size of a single ingest read, in bytes.
    pub packet_size: usize,
    /// Max number of pending connections per listener.
    pub listen_backlog: u32,
    /// Authentication backend configuration.
    pub auth: AuthConfig,
    /// Observability HTTP surface configuration.
    pub api: ApiConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            addresses: vec!["0.0.0.0:1337".to_string()],
            public_address: String::new(),
            latency_ms: 200,
            buffer_size: 384_000, // ~1s at 3Mbit/s
            sync_clients: false,
            loss_max_ttl: 0,
            packet_size: 1316,
            listen_backlog: 10,
            auth: AuthConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Selects and configures the authentication backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    /// Glob-allowlist authentication.
    Static {
        /// Patterns matched against the stream id's original string.
        #[serde(default = "default_allow")]
        allow: Vec<String>,
    },
    /// Delegates to an external HTTP endpoint.
    Http {
        /// URL to POST form data to.
        url: String,
        /// `app` form field.
        #[serde(default = "default_application")]
        application: String,
        /// Request timeout.
        #[serde(with = "duration_secs", default = "default_timeout")]
        timeout: Duration,
        /// Form field carrying the stream password.
        #[serde(default = "default_password_param")]
        password_param: String,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::Static {
            allow: default_allow(),
        }
    }
}

fn default_allow() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_application() -> String {
    "stream".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_password_param() -> String {
    "auth".to_string()
}

mod duration_secs {
    use super::Duration;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Configuration for the observability HTTP surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Whether the HTTP surface is started at all.
    pub enabled: bool,
    /// Bind address for the HTTP surface.
    pub address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            enabled: true,
            address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl RelayConfig {
    /// Tries each path in order, parsing the first one that exists as TOML.
    /// Falls back to [`RelayConfig::default`] if none exist.
    pub fn load(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut config = Self::read_from_paths(paths)?;
        if config.public_address.is_empty() {
            config.public_address = guess_public_address(&config.addresses);
            log::info!("assuming public address {}", config.public_address);
        }
        Ok(config)
    }

    fn read_from_paths(paths: &[impl AsRef<Path>]) -> Result<Self> {
        for path in paths {
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    log::info!("read config from {}", path.as_ref().display());
                    return toml::from_str(&contents)
                        .map_err(|e| RelayError::Config(e.to_string()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(RelayError::Io(e)),
            }
        }
        log::info!("no config file found, using defaults");
        Ok(RelayConfig::default())
    }

    /// The per-subscriber queue depth in buffers, derived from
    /// `buffer_size / packet_size`.
    pub fn queue_depth(&self) -> usize {
        (self.buffer_size / self.packet_size.max(1)).max(1)
    }
}

/// Guesses a client-reachable address from the first listen address, used
/// when `public_address` is left blank in config. The original resolves the
/// local hostname (`go-fqdn`) and substitutes it for a wildcard host; no
/// hostname-lookup crate is part of this crate's dependency stack, so a
/// wildcard host falls back to `localhost` instead.
fn guess_public_address(addresses: &[String]) -> String {
    let Some(first) = addresses.first() else {
        return String::new();
    };
    match first.rsplit_once(':') {
        Some((host, port)) if host.is_empty() || host == "0.0.0.0" || host == "::" => {
            format!("localhost:{port}")
        }
        _ => first.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_relay() {
        let config = RelayConfig::default();
        assert_eq!(config.addresses, vec!["0.0.0.0:1337"]);
        assert_eq!(config.buffer_size, 384_000);
        assert_eq!(config.packet_size, 1316);
        assert!(!config.sync_clients);
        assert!(matches!(config.auth, AuthConfig::Static { .. }));
        assert!(config.api.enabled);
    }

    #[test]
    fn load_falls_back_to_defaults_when_no_file_exists() {
        let config = RelayConfig::load(&["/nonexistent/path/one.toml", "/nonexistent/two.toml"])
            .unwrap();
        assert_eq!(config.addresses, RelayConfig::default().addresses);
    }

    #[test]
    fn queue_depth_divides_buffer_by_packet_size() {
        let mut config = RelayConfig::default();
        config.buffer_size = 4000;
        config.packet_size = 1000;
        assert_eq!(config.queue_depth(), 4);
    }

    #[test]
    fn load_guesses_public_address_from_wildcard_listen_address() {
        let config = RelayConfig::load(&["/nonexistent/path.toml"]).unwrap();
        assert_eq!(config.public_address, "localhost:1337");
    }

    #[test]
    fn guess_public_address_keeps_explicit_host() {
        assert_eq!(
            guess_public_address(&["stream.example.com:1337".to_string()]),
            "stream.example.com:1337"
        );
    }
}
