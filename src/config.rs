use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::transaction::{MonitorConfig, OrchestratorConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    #[serde(default)]
    pub use_json: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// In-memory ledger when unset
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    #[serde(default)]
    pub monitor: MonitorSection,
    /// Pre-provisioned wallet identities handed out at registration
    #[serde(default)]
    pub wallet_handles: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_wallet_timeout_ms")]
    pub timeout_ms: u64,
}

impl WalletConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrchestratorSection {
    /// Overall deadline for one API-initiated operation
    pub request_timeout_ms: u64,
    /// Budget for ledger writes after the wallet has answered
    pub bookkeeping_timeout_ms: u64,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            request_timeout_ms: 35_000,
            bookkeeping_timeout_ms: 5_000,
        }
    }
}

impl OrchestratorSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            bookkeeping_timeout: Duration::from_millis(self.bookkeeping_timeout_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorSection {
    pub enabled: bool,
    pub scan_interval_secs: u64,
    pub stale_after_secs: u64,
    pub batch_size: usize,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 30,
            stale_after_secs: 120,
            batch_size: 100,
        }
    }
}

impl MonitorSection {
    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            scan_interval: Duration::from_secs(self.scan_interval_secs),
            stale_after: Duration::from_secs(self.stale_after_secs),
            batch_size: self.batch_size,
        }
    }
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_wallet_timeout_ms() -> u64 {
    30_000
}

impl AppConfig {
    /// Reads `config/{env}.yaml`, then applies environment overrides.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// DATABASE_URL, WALLET_URL, WALLET_API_KEY, PORT, LOG_LEVEL
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.postgres_url = Some(url);
        }
        if let Some(url) = lookup("WALLET_URL") {
            self.wallet.base_url = url;
        }
        if let Some(key) = lookup("WALLET_API_KEY") {
            self.wallet.api_key = key;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(port) = lookup("PORT") {
            self.gateway.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "PORT",
                    value: port,
                })?;
        }
        Ok(())
    }
}
