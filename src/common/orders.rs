use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// The side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// What the venue should do when an order would match against one of the trader's own resting orders.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SelfTradeBehavior {
    /// Reject the incoming order instead of crossing our own book.
    #[default]
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePlacement {
    /// The order's side.
    pub side: Side,
    /// The order's price, in quote units per base unit.
    pub price: f64,
    /// The order's size, in base units.
    pub size: f64,
    /// The order's self trade behavior.
    pub self_trade_behavior: SelfTradeBehavior,
    /// The order's client id.
    pub client_order_id: u128,
    /// Whether the order may only be funded from tokens already deposited on the market.
    pub use_only_deposited_funds: bool,
    /// The last slot at which the order is valid, if any.
    pub last_valid_slot: Option<u64>,
    /// The last unix timestamp, in seconds, at which the order is valid, if any.
    pub last_valid_unix_timestamp_in_seconds: Option<u64>,
}

/// An action that can be bundled into a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Cancels every open order the trader has on the market.
    CancelAll,
    /// Places a new limit order.
    PlaceOrder(CandidatePlacement),
    /// Withdraws every deposited base and quote token from the market.
    WithdrawAll,
}

#[derive(Debug, Error)]
pub enum SubmitterError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("Refusing to submit an empty batch of actions.")]
    EmptyBatch,
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// Defines shared functionality for components that submit actions to the venue.
#[async_trait]
pub trait ActionSubmitter: Send + Sync {
    /// Bundles the given actions into a single atomic submission, signs it with the trader's identity
    /// and waits until the venue acknowledges it at the `confirmed` level.
    ///
    /// Either every action in the batch takes effect or none of them do.
    async fn submit(&self, actions: &[Action]) -> Result<Signature, SubmitterError>;
}
