//! Proposal special transactions
//!
//! A proposal can also be submitted on chain as a special transaction whose
//! payload commits to the funding window in superblock heights.

use super::superblock::{is_valid_block_height, payments_limit};
use crate::error::ProposalTxError;
use crate::ports::ChainStateProvider;
use bincode::Options;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, Script};
use tracing::debug;

/// Largest payload accepted for decoding
pub const MAX_PROPOSAL_TX_PAYLOAD: u64 = 10_000;

/// Kind of on-chain proposal
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    /// Treasury funding request
    Funding,
    /// Governance parameter change
    GovChange,
}

/// Payload of a proposal special transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTx {
    /// Payload version
    pub version: u16,
    /// Proposal kind
    pub proposal_type: ProposalType,
    /// Height of the block including the transaction
    pub height: i32,
    /// First superblock paying the proposal
    pub start_height: i32,
    /// Number of superblocks paying the proposal
    pub num_periods: u8,
    /// Amount per superblock in minor units
    pub amount: Amount,
    /// Payout script
    pub payout_script: Script,
    /// Proposal name
    pub name: String,
    /// Information URL
    pub url: String,
    /// Owner key id
    pub owner_key_id: [u8; 20],
}

impl ProposalTx {
    /// Highest payload version understood
    pub const CURRENT_VERSION: u16 = 1;

    /// Serialize the payload
    pub fn encode(&self) -> Result<Vec<u8>, ProposalTxError> {
        bincode::serialize(self).map_err(|_| ProposalTxError::BadPayload)
    }

    /// Deserialize a payload, bounded by [`MAX_PROPOSAL_TX_PAYLOAD`]
    pub fn decode(bytes: &[u8]) -> Result<Self, ProposalTxError> {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(MAX_PROPOSAL_TX_PAYLOAD)
            .deserialize(bytes)
            .map_err(|_| ProposalTxError::BadPayload)
    }

    /// Last superblock height paying the proposal
    pub fn end_height(&self, cycle_length: i64) -> Option<i64> {
        i64::from(self.num_periods)
            .checked_sub(1)?
            .checked_mul(cycle_length)?
            .checked_add(i64::from(self.start_height))
    }
}

/// Check a proposal special transaction payload included after `prev_height`
pub fn check_proposal_tx(
    payload: &[u8],
    prev_height: Option<i64>,
    chain: &dyn ChainStateProvider,
) -> Result<ProposalTx, ProposalTxError> {
    let tx = ProposalTx::decode(payload)?;

    if tx.version == 0 || tx.version > ProposalTx::CURRENT_VERSION {
        return Err(ProposalTxError::BadVersion);
    }
    if let Some(prev) = prev_height {
        if prev.checked_add(1) != Some(i64::from(tx.height)) {
            return Err(ProposalTxError::BadHeight);
        }
    }

    let params = chain.superblock_params();
    let start = i64::from(tx.start_height);
    if !is_valid_block_height(params, start) {
        return Err(ProposalTxError::BadStartHeight);
    }
    if tx.num_periods == 0 {
        return Err(ProposalTxError::BadPeriods);
    }
    match tx.end_height(params.cycle_length) {
        Some(end) if is_valid_block_height(params, end) && end <= i64::from(i32::MAX) => {}
        _ => return Err(ProposalTxError::BadEndHeight),
    }

    // Later superblocks never have a larger budget than the first one
    let budget = payments_limit(chain, start);
    if tx.amount <= 0 || tx.amount > budget {
        debug!(target: "gobject", amount = tx.amount, budget, "proposal tx amount rejected");
        return Err(ProposalTxError::BadAmount);
    }
    Ok(tx)
}
