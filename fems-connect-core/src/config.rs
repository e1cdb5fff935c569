//! Configuration management for the FEMS client.

use crate::retry::DEFAULT_RECONNECT_DELAY;
use crate::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Credential used by FEMS installations that were never given a custom password
pub const DEFAULT_PASSWORD: &str = "owner";

const WS_SCHEME: &str = "ws://";

/// Main configuration for the FEMS client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FemsConfig {
    /// FEMS edge websocket address as `host:port`
    pub url: String,

    /// Password for `authenticateWithPassword`
    #[serde(default = "default_password")]
    pub password: String,

    /// Channels to subscribe to, e.g. `_sum/GridActivePower`
    #[serde(default)]
    pub channels: Vec<String>,

    /// Fixed delay before every reconnect attempt
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Connector name (metrics label)
    #[serde(default = "default_connector_name")]
    pub connector_name: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_secs()
}

fn default_connector_name() -> String {
    "fems".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn parse_channels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

impl FemsConfig {
    /// Load configuration from a TOML file or the environment, then apply ENV overrides
    ///
    /// Priority: TOML file (`CONFIG_FILE`) → Environment variables
    pub fn load() -> ConnectorResult<Self> {
        let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_file(&config_file)?
        } else {
            Self::from_env()?
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FEMS_URL`: Required, edge websocket address (`host:port`)
    /// - `FEMS_PASSWORD`: Password (default: owner)
    /// - `FEMS_CHANNELS`: Required, comma-separated channel list
    /// - `FEMS_RECONNECT_DELAY_SECS`: Reconnect delay (default: 10)
    /// - `CONNECTOR_NAME`: Connector name (default: fems)
    /// - `LOG_LEVEL`: Log level (default: info)
    pub fn from_env() -> ConnectorResult<Self> {
        let url = env::var("FEMS_URL").map_err(|_| ConnectorError::config("FEMS URL missing"))?;

        let password = env::var("FEMS_PASSWORD").unwrap_or_else(|_| default_password());

        let channels = env::var("FEMS_CHANNELS")
            .map(|raw| parse_channels(&raw))
            .unwrap_or_default();

        let reconnect_delay_secs = env::var("FEMS_RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_reconnect_delay_secs);

        let connector_name = env::var("CONNECTOR_NAME").unwrap_or_else(|_| default_connector_name());

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level());

        Ok(Self {
            url,
            password,
            channels,
            reconnect_delay_secs,
            connector_name,
            log_level,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> ConnectorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConnectorError::Configuration(msg) => {
                ConnectorError::config(format!("Failed to parse config file {}: {}", path, msg))
            }
            other => other,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> ConnectorResult<Self> {
        toml::from_str(content).map_err(|e| ConnectorError::config(e.to_string()))
    }

    /// Apply environment variable overrides on top of a loaded file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("FEMS_URL") {
            self.url = val;
        }
        if let Ok(val) = env::var("FEMS_PASSWORD") {
            self.password = val;
        }
        if let Ok(val) = env::var("FEMS_CHANNELS") {
            self.channels = parse_channels(&val);
        }
        if let Ok(val) = env::var("FEMS_RECONNECT_DELAY_SECS") {
            if let Ok(n) = val.parse() {
                self.reconnect_delay_secs = n;
            }
        }
        if let Ok(val) = env::var("CONNECTOR_NAME") {
            self.connector_name = val;
        }
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.log_level = val;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConnectorResult<()> {
        let host = self.url.trim();
        if host.is_empty() || host == WS_SCHEME {
            return Err(ConnectorError::config("FEMS URL missing"));
        }

        if host.contains("://") && !host.starts_with(WS_SCHEME) {
            return Err(ConnectorError::config(format!(
                "unsupported scheme in FEMS URL {}, expected host:port",
                host
            )));
        }

        if self.channels.is_empty() {
            return Err(ConnectorError::config("No FEMS channels configured"));
        }

        if self.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(ConnectorError::config("FEMS channel names cannot be empty"));
        }

        if self.reconnect_delay_secs == 0 {
            return Err(ConnectorError::config("reconnect_delay_secs must be > 0"));
        }

        Ok(())
    }

    /// Validate and freeze the settings the connection needs
    pub fn target(&self) -> ConnectorResult<ConnectionTarget> {
        self.validate()?;

        let host = self.url.trim();
        let host = host.strip_prefix(WS_SCHEME).unwrap_or(host);

        let password = if self.password.is_empty() {
            default_password()
        } else {
            self.password.clone()
        };

        Ok(ConnectionTarget {
            endpoint: format!("{}{}", WS_SCHEME, host),
            password,
            channels: self.channels.clone(),
        })
    }

    /// Delay applied before each reconnect attempt
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for FemsConfig {
    fn default() -> Self {
        Self {
            url: "localhost:8085".to_string(),
            password: default_password(),
            channels: Vec::new(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            connector_name: default_connector_name(),
            log_level: default_log_level(),
        }
    }
}

/// Validated, immutable connection settings owned by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    endpoint: String,
    password: String,
    channels: Vec<String>,
}

impl ConnectionTarget {
    /// Full websocket URL, always `ws://host:port`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Channels in configured order
    pub fn channels(&self) -> &[String] {
        &self.channels
    }
}
