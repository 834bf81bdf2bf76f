//! Store configuration

use docbridge_common::{DocBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection pool configuration handed to the driver on connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool (default: 5)
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_pool_size: Option<u32>,
    /// Seconds a connection can remain idle before being closed (default: none)
    pub max_idle_time_secs: Option<u64>,
    /// Connection timeout in seconds (default: 10)
    pub connect_timeout_secs: Option<u64>,
    /// Server selection timeout in seconds (default: 30)
    pub server_selection_timeout_secs: Option<u64>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: Some(5),
            max_pool_size: Some(20),
            max_idle_time_secs: None,
            connect_timeout_secs: Some(10),
            server_selection_timeout_secs: Some(30),
            app_name: Some("docbridge".to_string()),
        }
    }
}

impl PoolConfig {
    pub fn max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout_secs.map(Duration::from_secs)
    }
}

/// Everything needed to open the store connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Logical database name, appended to the address when connecting
    pub name: String,
    /// Server address, e.g. "mongodb://localhost:27017/"
    pub address: String,
    /// Fixed delay between connection attempts
    pub retry_delay_ms: u64,
    pub pool: PoolConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: "mongodb://localhost:27017/".to_string(),
            retry_delay_ms: 1000,
            pool: PoolConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the delay between connection attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Set the pool configuration
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Parse a JSON configuration; omitted fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check the fields a connection attempt can't do without
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DocBridgeError::Configuration(
                "database name cannot be empty".to_string(),
            ));
        }
        if self.address.is_empty() {
            return Err(DocBridgeError::Configuration(
                "address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
