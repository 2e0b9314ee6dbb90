//! API server configuration.

use serde::Deserialize;

/// Top-level API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Router TOML config path. Router defaults when unset.
    #[serde(default)]
    pub router_config: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl ApiConfig {
    /// Load config from `API_HOST`, `API_PORT` and `ATOMIC_ROUTER_CONFIG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: lookup("API_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            router_config: lookup("ATOMIC_ROUTER_CONFIG").filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            router_config: None,
        }
    }
}
