use async_trait::async_trait;
use log::info;
use phoenix::program::get_seat_address;
use phoenix_seat_manager::instruction_builders::create_claim_seat_instruction;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Keypair, signer::Signer};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use std::sync::Arc;

use crate::{
    common::setup::{MakerSetup, SetupError, SetupOutcome},
    utils::{accounts::account_exists, transactions::send_transaction},
};

use super::market::MarketMetadata;

/// The exchange-side accounts a trader is missing before it can place orders.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MissingAccounts {
    pub base_token_account: bool,
    pub quote_token_account: bool,
    pub seat: bool,
}

/// Prepares a trader to make markets on a Phoenix market.
pub struct PhoenixMakerSetup {
    rpc_client: Arc<RpcClient>,
    signer: Arc<Keypair>,
    market: MarketMetadata,
}

impl PhoenixMakerSetup {
    pub fn new(rpc_client: Arc<RpcClient>, signer: Arc<Keypair>, market: MarketMetadata) -> Self {
        Self {
            rpc_client,
            signer,
            market,
        }
    }

    /// Checks which of the trader's token accounts and seat don't exist yet.
    pub async fn get_missing_accounts(&self) -> Result<MissingAccounts, ClientError> {
        let trader = self.signer.pubkey();

        let base_token_account = get_associated_token_address(&trader, &self.market.base_mint);
        let quote_token_account = get_associated_token_address(&trader, &self.market.quote_mint);
        let (seat, _) = get_seat_address(&self.market.address, &trader);

        let missing = MissingAccounts {
            base_token_account: !account_exists(&self.rpc_client, &base_token_account).await?,
            quote_token_account: !account_exists(&self.rpc_client, &quote_token_account).await?,
            seat: !account_exists(&self.rpc_client, &seat).await?,
        };

        info!(
            "Maker accounts for {} - Base token account: {} - Quote token account: {} - Seat: {}",
            trader,
            if missing.base_token_account { "missing" } else { "ok" },
            if missing.quote_token_account { "missing" } else { "ok" },
            if missing.seat { "missing" } else { "ok" },
        );

        Ok(missing)
    }
}

#[async_trait]
impl MakerSetup for PhoenixMakerSetup {
    async fn setup_if_needed(&self) -> Result<SetupOutcome, SetupError> {
        let missing = self.get_missing_accounts().await?;
        let ixs = build_setup_instructions(&self.signer.pubkey(), &self.market, &missing);

        info!("Setup instructions required: {}", ixs.len());
        if ixs.is_empty() {
            return Ok(SetupOutcome::NotRequired);
        }

        let signature = send_transaction(&self.rpc_client, &ixs, &self.signer).await?;

        Ok(SetupOutcome::Submitted {
            signature,
            num_instructions: ixs.len(),
        })
    }
}

/// Gets the minimal set of instructions that create the missing accounts.
pub fn build_setup_instructions(
    trader: &Pubkey,
    market: &MarketMetadata,
    missing: &MissingAccounts,
) -> Vec<Instruction> {
    let mut ixs = Vec::new();

    if missing.base_token_account {
        ixs.push(create_associated_token_account(
            trader,
            trader,
            &market.base_mint,
            &spl_token::id(),
        ));
    }
    if missing.quote_token_account {
        ixs.push(create_associated_token_account(
            trader,
            trader,
            &market.quote_mint,
            &spl_token::id(),
        ));
    }
    if missing.seat {
        ixs.push(create_claim_seat_instruction(trader, &market.address));
    }

    ixs
}
