use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleProviderError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Could not decode price response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Could not parse price from {value:?}")]
    Unparseable { value: String },
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),
}

/// Represents centralized exchange based oracle sources.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum CentralizedExchangeSource {
    #[default]
    Coinbase,
}

/// Represents the source type of the [`OracleInfo`] source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleInfoSource {
    /// Centralized exchange.
    Cex(CentralizedExchangeSource),
}

impl Default for OracleInfoSource {
    fn default() -> Self {
        Self::Cex(CentralizedExchangeSource::Coinbase)
    }
}

/// Represents a single reference price observation.
#[derive(Debug, Default, Clone)]
pub struct OracleInfo {
    /// The symbol of the underlying asset this price represents.
    pub symbol: String,
    /// The source of this oracle info.
    pub source: OracleInfoSource,
    /// The price of the asset, always finite and strictly positive.
    pub price: f64,
    /// Timestamp of when this price was recorded, in milliseconds.
    pub timestamp: u128,
}

/// A trait that represents shared functionality for oracle providers.
#[async_trait]
pub trait OracleProvider: Send + Sync {
    /// Fetches a fresh reference price.
    ///
    /// Implementations must never return a price that fails [`validate_price`].
    async fn fetch_price(&self) -> Result<OracleInfo, OracleProviderError>;

    /// The symbol that this [`OracleProvider`] represents.
    fn symbol(&self) -> &str;
}

/// Parses a decimal price string, rejecting anything that is not a finite positive number.
pub fn parse_price(value: &str) -> Result<f64, OracleProviderError> {
    let price = value
        .trim()
        .parse::<f64>()
        .map_err(|_| OracleProviderError::Unparseable {
            value: value.to_string(),
        })?;
    validate_price(price)
}

pub fn validate_price(price: f64) -> Result<f64, OracleProviderError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(OracleProviderError::InvalidPrice(price))
    }
}
