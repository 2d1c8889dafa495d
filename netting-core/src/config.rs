//! Configuration for the payment system

use crate::types::{AccountId, ClearingPool};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Payment system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Clearing pool configuration
    pub pool: PoolConfig,

    /// Netting configuration
    pub netting: NettingConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "netting-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            pool: PoolConfig::default(),
            netting: NettingConfig::default(),
            actor: ActorConfig::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Clearing pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool identifier
    pub pool_id: String,

    /// Clearing account (defaults to the pool identifier)
    pub clearing_account: Option<String>,

    /// Ticker symbol
    pub symbol: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_id: "CORRA".to_string(),
            clearing_account: None,
            symbol: "CorrA$".to_string(),
        }
    }
}

impl PoolConfig {
    /// Build the clearing pool
    pub fn to_pool(&self) -> ClearingPool {
        let pool = ClearingPool::new(self.pool_id.clone(), self.symbol.clone());
        match &self.clearing_account {
            Some(account) => pool.with_clearing_account(AccountId::new(account.clone())),
            None => pool,
        }
    }
}

/// Netting configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// What a successful pass does to the registry and prior output
    pub output_policy: OutputPolicy,
}

/// Effect of a successful netting pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Append output, keep the registry; repeated passes re-append
    Accumulate,
    /// Replace prior output, keep the registry
    ClearPrevious,
    /// Append output and remove the netted legs from the registry
    #[default]
    ConsumeBatch,
}

impl FromStr for OutputPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "accumulate" => Ok(OutputPolicy::Accumulate),
            "clear_previous" => Ok(OutputPolicy::ClearPrevious),
            "consume_batch" => Ok(OutputPolicy::ConsumeBatch),
            other => Err(crate::Error::Config(format!("Unknown output policy: {}", other))),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Mailbox capacity (requests)
    pub mailbox_capacity: usize,

    /// Event broadcast capacity
    pub event_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
            event_capacity: 256,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::Error::Config(format!("Unknown log format: {}", other))),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(pool_id) = std::env::var("NETTING_POOL_ID") {
            config.pool.pool_id = pool_id;
        }

        if let Ok(account) = std::env::var("NETTING_CLEARING_ACCOUNT") {
            config.pool.clearing_account = Some(account);
        }

        if let Ok(symbol) = std::env::var("NETTING_POOL_SYMBOL") {
            config.pool.symbol = symbol;
        }

        if let Ok(policy) = std::env::var("NETTING_OUTPUT_POLICY") {
            config.netting.output_policy = policy.parse()?;
        }

        if let Ok(format) = std::env::var("NETTING_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.pool.pool_id.is_empty() {
            return Err(crate::Error::Config("pool.pool_id must not be empty".to_string()));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.actor.event_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.event_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
