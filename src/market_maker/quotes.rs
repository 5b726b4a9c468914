use crate::common::orders::{CandidatePlacement, SelfTradeBehavior, Side};

use super::config::Config;

/// The pair of prices the maker offers around a reference price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    /// Places the bid `edge` below and the ask `edge` above the reference price.
    pub fn around(reference_price: f64, edge: f64) -> Self {
        Self {
            bid: reference_price - edge,
            ask: reference_price + edge,
        }
    }
}

/// Builds the two resting orders for a cycle.
///
/// Everything here is pure, the caller supplies the clock and the client order ids.
#[derive(Debug, Clone)]
pub struct QuoteGenerator {
    edge: f64,
    order_size: f64,
    order_lifetime_secs: u64,
}

impl QuoteGenerator {
    pub fn new(edge: f64, order_size: f64, order_lifetime_secs: u64) -> Self {
        Self {
            edge,
            order_size,
            order_lifetime_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.edge, config.order_size, config.order_lifetime_secs)
    }

    pub fn quote(&self, reference_price: f64) -> Quote {
        Quote::around(reference_price, self.edge)
    }

    /// Gets the bid and the ask for the given quote, in that order.
    pub fn build_orders(
        &self,
        quote: &Quote,
        now_unix_secs: u64,
        bid_client_order_id: u128,
        ask_client_order_id: u128,
    ) -> [CandidatePlacement; 2] {
        let expiration = now_unix_secs.saturating_add(self.order_lifetime_secs);
        [
            self.build_order(Side::Bid, quote.bid, expiration, bid_client_order_id),
            self.build_order(Side::Ask, quote.ask, expiration, ask_client_order_id),
        ]
    }

    fn build_order(
        &self,
        side: Side,
        price: f64,
        expiration: u64,
        client_order_id: u128,
    ) -> CandidatePlacement {
        CandidatePlacement {
            side,
            price,
            size: self.order_size,
            self_trade_behavior: SelfTradeBehavior::Abort,
            client_order_id,
            use_only_deposited_funds: false,
            last_valid_slot: None,
            last_valid_unix_timestamp_in_seconds: Some(expiration),
        }
    }
}
