use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

/// Checks whether an account exists at the given address.
pub async fn account_exists(rpc_client: &RpcClient, address: &Pubkey) -> Result<bool, ClientError> {
    let res = rpc_client
        .get_account_with_commitment(address, CommitmentConfig::confirmed())
        .await?;
    Ok(res.value.is_some())
}
