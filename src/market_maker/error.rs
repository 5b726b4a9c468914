use thiserror::Error;

use crate::{
    common::{oracle::OracleProviderError, setup::SetupError},
    config::ConfigError,
    exchange::market::MarketError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Oracle(#[from] OracleProviderError),
    #[error("Maker setup failed: {0}")]
    Setup(#[from] SetupError),
}
