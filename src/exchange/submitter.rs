use async_trait::async_trait;
use log::info;
use phoenix::{
    program::instruction_builders::{
        create_cancel_all_orders_instruction, create_new_order_instruction,
        create_withdraw_funds_instruction,
    },
    state::{
        OrderPacket, SelfTradeBehavior as PhoenixSelfTradeBehavior, Side as PhoenixSide,
    },
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use std::sync::Arc;

use crate::{
    common::orders::{
        Action, ActionSubmitter, CandidatePlacement, SelfTradeBehavior, Side, SubmitterError,
    },
    utils::transactions::send_transaction,
};

use super::market::MarketMetadata;

/// Submits batches of actions to a Phoenix market, one transaction per batch.
pub struct PhoenixActionSubmitter {
    rpc_client: Arc<RpcClient>,
    signer: Arc<Keypair>,
    market: MarketMetadata,
}

impl PhoenixActionSubmitter {
    pub fn new(rpc_client: Arc<RpcClient>, signer: Arc<Keypair>, market: MarketMetadata) -> Self {
        Self {
            rpc_client,
            signer,
            market,
        }
    }
}

#[async_trait]
impl ActionSubmitter for PhoenixActionSubmitter {
    async fn submit(&self, actions: &[Action]) -> Result<Signature, SubmitterError> {
        let ixs = build_instructions(&self.market, &self.signer.pubkey(), actions)?;

        info!(
            "Submitting {} instructions to market {}.",
            ixs.len(),
            self.market.address
        );

        Ok(send_transaction(&self.rpc_client, &ixs, &self.signer).await?)
    }
}

/// Translates the actions into Phoenix instructions, preserving their order.
///
/// Nothing is returned unless every action could be translated, so a batch is never partially submitted.
pub fn build_instructions(
    market: &MarketMetadata,
    trader: &Pubkey,
    actions: &[Action],
) -> Result<Vec<Instruction>, SubmitterError> {
    if actions.is_empty() {
        return Err(SubmitterError::EmptyBatch);
    }

    actions
        .iter()
        .map(|action| match action {
            Action::CancelAll => Ok(create_cancel_all_orders_instruction(
                &market.address,
                trader,
                &market.base_mint,
                &market.quote_mint,
            )),
            Action::PlaceOrder(placement) => {
                let packet = build_order_packet(market, placement)?;
                Ok(create_new_order_instruction(
                    &market.address,
                    trader,
                    &market.base_mint,
                    &market.quote_mint,
                    &packet,
                ))
            }
            Action::WithdrawAll => Ok(create_withdraw_funds_instruction(
                &market.address,
                trader,
                &market.base_mint,
                &market.quote_mint,
            )),
        })
        .collect()
}

fn build_order_packet(
    market: &MarketMetadata,
    placement: &CandidatePlacement,
) -> Result<OrderPacket, SubmitterError> {
    let price_in_ticks = market.float_price_to_ticks(placement.price);
    if price_in_ticks == 0 {
        return Err(SubmitterError::InvalidOrder(format!(
            "{:?} price {} is below one tick",
            placement.side, placement.price
        )));
    }
    let num_base_lots = market.raw_base_units_to_base_lots(placement.size);
    if num_base_lots == 0 {
        return Err(SubmitterError::InvalidOrder(format!(
            "{:?} size {} is below one lot",
            placement.side, placement.size
        )));
    }

    let side = match placement.side {
        Side::Bid => PhoenixSide::Bid,
        Side::Ask => PhoenixSide::Ask,
    };
    let self_trade_behavior = match placement.self_trade_behavior {
        SelfTradeBehavior::Abort => PhoenixSelfTradeBehavior::Abort,
    };

    let mut packet = OrderPacket::new_limit_order(
        side,
        price_in_ticks,
        num_base_lots,
        self_trade_behavior,
        None,
        placement.client_order_id,
        placement.use_only_deposited_funds,
    );
    if let OrderPacket::Limit {
        last_valid_slot,
        last_valid_unix_timestamp_in_seconds,
        ..
    } = &mut packet
    {
        *last_valid_slot = placement.last_valid_slot;
        *last_valid_unix_timestamp_in_seconds = placement.last_valid_unix_timestamp_in_seconds;
    }

    Ok(packet)
}
