use {
    self::command::CliCommand,
    crate::market_maker::error::Error as MarketMakerError,
    solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient},
    solana_sdk::signature::Keypair,
    std::sync::Arc,
    thiserror::Error,
};

pub mod app;
pub mod args;
pub mod command;
pub mod market_maker;

pub use app::*;

/// The config of the CLI.
/// This structure holds all necessary information to process and execute a command.
pub struct CliConfig {
    /// The command we are processing.
    pub command: CliCommand,
    /// The URL for the JSON RPC API we are using.
    /// See: https://docs.solana.com/developing/clients/jsonrpc-api#json-rpc-api-reference
    pub json_rpc_url: String,
    /// The initialized RPC Client.
    pub rpc_client: Arc<RpcClient>,
    /// The loaded keypair, used to sign every transaction.
    pub keypair: Arc<Keypair>,
}

/// The result of a CLI command.
#[derive(Debug)]
pub struct CliResult {}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Bad parameter: {0}")]
    BadParameters(String),
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("Command not recognized: {0}")]
    CommandNotRecognized(String),
    #[error("Keypair error: {0}")]
    KeypairError(String),
    #[error("Market maker error: {0}")]
    MarketMaker(#[from] MarketMakerError),
}
