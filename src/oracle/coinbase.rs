use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde::Deserialize;
use std::{
    any::type_name,
    time::Duration,
};

use crate::common::oracle::{
    parse_price, CentralizedExchangeSource, OracleInfo, OracleInfoSource, OracleProvider,
    OracleProviderError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SpotPriceResponse {
    data: SpotPrice,
}

#[derive(Debug, Deserialize)]
struct SpotPrice {
    amount: String,
}

/// Fetches spot prices from Coinbase's public price api.
pub struct CoinbaseOracleProvider {
    client: reqwest::Client,
    base_url: String,
    symbol: String,
}

impl CoinbaseOracleProvider {
    pub fn new(base_url: &str, symbol: &str) -> Result<Self, OracleProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_string(),
        })
    }

    fn spot_url(&self) -> String {
        format!("{}/v2/prices/{}/spot", self.base_url, self.symbol)
    }
}

#[async_trait]
impl OracleProvider for CoinbaseOracleProvider {
    async fn fetch_price(&self) -> Result<OracleInfo, OracleProviderError> {
        let body = self
            .client
            .get(self.spot_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let price = parse_spot_response(&body)?;

        info!(
            "{} - [{}] Spot price: {}",
            type_name::<Self>(),
            self.symbol,
            price
        );

        Ok(OracleInfo {
            symbol: self.symbol.to_string(),
            source: OracleInfoSource::Cex(CentralizedExchangeSource::Coinbase),
            price,
            timestamp: now_unix_millis(),
        })
    }

    fn symbol(&self) -> &str {
        self.symbol.as_str()
    }
}

/// Decodes `{"data":{"amount":"..."}}` into a validated price.
fn parse_spot_response(body: &str) -> Result<f64, OracleProviderError> {
    let response: SpotPriceResponse = serde_json::from_str(body)?;
    parse_price(&response.data.amount)
}

fn now_unix_millis() -> u128 {
    u128::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
