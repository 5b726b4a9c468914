use log::warn;
use solana_client::{
    client_error::ClientError, nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

/// Builds a transaction out of the given instructions, signs it and waits until it is confirmed.
///
/// Preflight checks are skipped, the venue is the only judge of whether the transaction is valid.
pub async fn send_transaction(
    rpc_client: &RpcClient,
    ixs: &[Instruction],
    signer: &Keypair,
) -> Result<Signature, ClientError> {
    let blockhash = rpc_client.get_latest_blockhash().await?;
    let tx = Transaction::new_signed_with_payer(ixs, Some(&signer.pubkey()), &[signer], blockhash);

    let res = rpc_client
        .send_and_confirm_transaction_with_spinner_and_config(
            &tx,
            CommitmentConfig::confirmed(),
            RpcSendTransactionConfig {
                skip_preflight: true,
                ..Default::default()
            },
        )
        .await;

    match res {
        Ok(s) => Ok(s),
        Err(e) => {
            warn!("There was an error submitting transaction: {:?}", e);
            if let Some(err) = e.get_transaction_error() {
                warn!("Error: {}", err);
            }
            Err(e)
        }
    }
}

pub fn tx_link(signature: &Signature) -> String {
    format!("https://solscan.io/tx/{}", signature)
}
