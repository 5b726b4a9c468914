use log::info;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{str::FromStr, time::Duration};

use crate::config::{ConfigError, PersistentConfig};

pub const DEFAULT_PRICE_API_URL: &str = "https://api.coinbase.com";

/// What the runner does when the terminal withdrawal cycle fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeardownPolicy {
    /// Attempt the terminal cycle once and stop regardless of the outcome.
    #[default]
    BestEffort,
    /// Keep retrying the terminal cycle until the withdrawal is confirmed.
    ///
    /// Retries are sent back to back with no pause, so a withdrawal that keeps failing
    /// hits the rpc endpoint in a tight loop until it goes through.
    UntilConfirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// the address of the market to make
    pub market: String,
    /// the symbol of the reference price, e.g. `SOL-USD`
    #[serde(default = "default_price_symbol")]
    pub price_symbol: String,
    /// the base url of the spot price api
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    /// the offset from the reference price on each side, in quote units
    #[serde(default = "default_edge")]
    pub edge: f64,
    /// the size of each order, in base units
    #[serde(default = "default_order_size")]
    pub order_size: f64,
    /// how long each order stays valid after submission
    #[serde(default = "default_order_lifetime_secs")]
    pub order_lifetime_secs: u64,
    /// the number of quoting cycles before funds are withdrawn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// the delay between completed cycles
    #[serde(default = "default_refresh_frequency_ms")]
    pub refresh_frequency_ms: u64,
    #[serde(default)]
    pub teardown: TeardownPolicy,
}

fn default_price_symbol() -> String {
    "SOL-USD".to_string()
}

fn default_price_api_url() -> String {
    DEFAULT_PRICE_API_URL.to_string()
}

fn default_edge() -> f64 {
    0.5
}

fn default_order_size() -> f64 {
    1.0
}

fn default_order_lifetime_secs() -> u64 {
    7
}

fn default_max_iterations() -> u64 {
    3
}

fn default_refresh_frequency_ms() -> u64 {
    2_000
}

impl PersistentConfig for Config {}

impl Config {
    /// Creates a [`Config`] for the given market with every other value at its default.
    #[cfg(test)]
    pub fn new(market: &Pubkey) -> Self {
        Self {
            market: market.to_string(),
            price_symbol: default_price_symbol(),
            price_api_url: default_price_api_url(),
            edge: default_edge(),
            order_size: default_order_size(),
            order_lifetime_secs: default_order_lifetime_secs(),
            max_iterations: default_max_iterations(),
            refresh_frequency_ms: default_refresh_frequency_ms(),
            teardown: TeardownPolicy::default(),
        }
    }

    pub fn market_pubkey(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.market).map_err(|_| ConfigError::InvalidPubkey {
            field: "market",
            value: self.market.clone(),
        })
    }

    pub fn refresh_frequency(&self) -> Duration {
        Duration::from_millis(self.refresh_frequency_ms)
    }

    /// Checks the values that the quoting loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.market_pubkey()?;

        if !self.edge.is_finite() || self.edge < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "edge",
                reason: format!("must be a non-negative number, got {}", self.edge),
            });
        }
        if !self.order_size.is_finite() || self.order_size <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "orderSize",
                reason: format!("must be a positive number, got {}", self.order_size),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxIterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.price_symbol.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "priceSymbol",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config = Config::load(path)?;
    config.validate()?;

    info!(
        "Quoting {} - Edge: {} - Size: {} - Lifetime: {}s - Iterations: {} - Refresh: {}ms",
        config.market,
        config.edge,
        config.order_size,
        config.order_lifetime_secs,
        config.max_iterations,
        config.refresh_frequency_ms
    );

    Ok(config)
}
