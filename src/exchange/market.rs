use phoenix::{program::MarketHeader, quantities::WrapperU64};
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::mem::size_of;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("Market data not found for {0}")]
    NotFound(Pubkey),
    #[error("Could not decode market header for {0}")]
    InvalidHeader(Pubkey),
}

/// The static parameters of a Phoenix market needed to express orders in its native units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketMetadata {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_decimals: u32,
    pub quote_decimals: u32,
    /// Base atoms per base lot.
    pub base_lot_size: u64,
    /// Quote atoms per quote lot.
    pub quote_lot_size: u64,
    pub tick_size_in_quote_atoms_per_base_unit: u64,
    pub raw_base_units_per_base_unit: u32,
}

impl MarketMetadata {
    /// Fetches and decodes the market's header.
    pub async fn load(rpc_client: &RpcClient, market: &Pubkey) -> Result<Self, MarketError> {
        let res = rpc_client
            .get_account_with_commitment(market, CommitmentConfig::confirmed())
            .await?;
        let account = res.value.ok_or(MarketError::NotFound(*market))?;
        Self::from_account_data(market, &account.data)
    }

    pub fn from_account_data(market: &Pubkey, data: &[u8]) -> Result<Self, MarketError> {
        let header_bytes = data
            .get(..size_of::<MarketHeader>())
            .ok_or(MarketError::InvalidHeader(*market))?;
        let header = bytemuck::try_pod_read_unaligned::<MarketHeader>(header_bytes)
            .map_err(|_| MarketError::InvalidHeader(*market))?;

        Ok(Self {
            address: *market,
            base_mint: header.base_params.mint_key,
            quote_mint: header.quote_params.mint_key,
            base_decimals: header.base_params.decimals,
            quote_decimals: header.quote_params.decimals,
            base_lot_size: header.get_base_lot_size().as_u64(),
            quote_lot_size: header.get_quote_lot_size().as_u64(),
            tick_size_in_quote_atoms_per_base_unit: header
                .get_tick_size_in_quote_atoms_per_base_unit()
                .as_u64(),
            raw_base_units_per_base_unit: header.raw_base_units_per_base_unit,
        })
    }

    /// Converts a price in quote units per raw base unit into ticks, rounding down.
    pub fn float_price_to_ticks(&self, price: f64) -> u64 {
        let quote_atoms_per_base_unit = price
            * 10f64.powi(self.quote_decimals as i32)
            * self.raw_base_units_per_base_unit as f64;
        round_down(quote_atoms_per_base_unit / self.tick_size_in_quote_atoms_per_base_unit as f64)
    }

    /// Converts a size in raw base units into base lots, rounding down.
    pub fn raw_base_units_to_base_lots(&self, raw_base_units: f64) -> u64 {
        let base_atoms = raw_base_units * 10f64.powi(self.base_decimals as i32);
        round_down(base_atoms / self.base_lot_size as f64)
    }

    /// The number of decimals needed to represent a single tick, in quote units per raw base unit.
    pub fn price_decimal_places(&self) -> usize {
        let tick_size = self.tick_size_in_quote_atoms_per_base_unit as f64
            / 10f64.powi(self.quote_decimals as i32)
            / self.raw_base_units_per_base_unit as f64;
        if tick_size >= 1.0 || tick_size <= 0.0 {
            return 0;
        }
        (-tick_size.log10() - 1e-9).ceil() as usize
    }
}

/// Floors the value, unless it is within float noise of the next integer.
fn round_down(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let nearest = value.round();
    if (value - nearest).abs() < 1e-6 {
        nearest as u64
    } else {
        value.floor() as u64
    }
}
