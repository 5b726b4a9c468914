use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_sdk::signature::Signature;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
}

/// The result of preparing a trader to make markets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The trader already had everything it needs.
    NotRequired,
    /// Setup instructions were submitted and confirmed.
    Submitted {
        signature: Signature,
        num_instructions: usize,
    },
}

/// Defines shared functionality for components that prepare the exchange-side accounts a maker needs.
#[async_trait]
pub trait MakerSetup: Send + Sync {
    /// Submits the minimal set of setup instructions as one atomic transaction, if any are needed,
    /// and only returns once that transaction is confirmed.
    async fn setup_if_needed(&self) -> Result<SetupOutcome, SetupError>;
}
