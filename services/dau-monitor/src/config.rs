//! Configuration types for the DAU monitor service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::fetcher::RetryPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Config {
    /// Retry policy handed to the fetcher for each site
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.fetch.max_retries,
            timeout: Duration::from_secs(self.fetch.timeout_seconds),
            backoff_unit: Duration::from_millis(self.fetch.backoff_unit_ms),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.delivery_timeout_seconds)
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL advertised in integration.json; derived from the Host header when unset
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            public_url: None,
        }
    }
}

/// Outbound request tuning for metric fetches and report delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-attempt timeout for a metric fetch
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total attempts per site
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff after attempt n is 2^n times this unit
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub delivery_timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            backoff_unit_ms: default_backoff_unit_ms(),
            delivery_timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DauMonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
