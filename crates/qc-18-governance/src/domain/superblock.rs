//! Superblocks: height-anchored payment schedules with a lifecycle

use super::entities::{
    GovernanceObjectId, GovernanceObjectType, GovernancePayment, PaymentSchedule,
    SuperblockStatus,
};
use super::payload::{decode_payload, trigger_height, TriggerEncoding};
use crate::config::{ExpirationConfig, SuperblockParams};
use crate::error::{GovernanceError, Result};
use crate::ports::{AddressCodec, ChainStateProvider, GovernanceView};
use shared_types::{compact_from_u256, Amount, Transaction, TxOut};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, warn};

/// True iff `height` is at or after activation and on a cycle boundary
pub fn is_valid_block_height(params: &SuperblockParams, height: i64) -> bool {
    params.cycle_length > 0
        && height >= params.activation_height
        && height % params.cycle_length == 0
}

/// Last and next superblock heights around `height`
///
/// Before the first superblock the last height is reported as 0.
pub fn nearest_superblock_heights(params: &SuperblockParams, height: i64) -> (i64, i64) {
    let cycle = params.cycle_length.max(1);
    let start = params.activation_height;
    let first = start + (cycle - start.rem_euclid(cycle)) % cycle;
    if height < first {
        (0, first)
    } else {
        let last = height - height % cycle;
        (last, last + cycle)
    }
}

/// Most a superblock at `height` may pay out in total
///
/// Zero for heights that cannot carry a superblock. Otherwise the
/// superblock share of the subsidy at `height - 1`, once per block of the
/// cycle. Networks that allow minimum-difficulty blocks price the share at
/// the proof-of-work limit, the lowest subsidy.
pub fn payments_limit(chain: &dyn ChainStateProvider, height: i64) -> Amount {
    let params = chain.superblock_params();
    if !is_valid_block_height(params, height) {
        return 0;
    }
    let bits = if params.allow_min_difficulty_blocks {
        compact_from_u256(params.pow_limit)
    } else {
        1
    };
    let share = chain.block_subsidy(bits, height - 1, true);
    let limit = share.saturating_mul(params.cycle_length);
    debug!(target: "gobject", height, limit, "superblock payments limit");
    limit
}

/// A trigger decoded into a payment schedule
///
/// Shared by reference between the registry and in-flight queries; only the
/// status changes after construction.
#[derive(Debug)]
pub struct Superblock {
    object_id: GovernanceObjectId,
    schedule: PaymentSchedule,
    status: AtomicU8,
}

impl Superblock {
    /// Build a superblock from a trigger object in the store
    pub fn from_object(
        view: &dyn GovernanceView,
        object_id: GovernanceObjectId,
        codec: &dyn AddressCodec,
        params: &SuperblockParams,
    ) -> Result<Self> {
        let object = view
            .find(&object_id)
            .ok_or_else(|| GovernanceError::ObjectNotFound(object_id.to_hex()))?;
        if object.object_type() != GovernanceObjectType::Trigger {
            return Err(GovernanceError::NotATrigger(object_id.to_hex()));
        }

        let payload = decode_payload(object.payload_hex())?;
        let target_height = trigger_height(&payload)?;
        if !is_valid_block_height(params, target_height) {
            return Err(GovernanceError::InvalidSuperblockHeight(target_height));
        }

        let payments = TriggerEncoding::detect(&payload)?.into_payments(false)?;
        if payments.is_empty() {
            return Err(GovernanceError::NoPayments);
        }

        let payments = payments
            .into_iter()
            .map(|payment| -> Result<GovernancePayment> {
                let destination = codec
                    .decode(&payment.address)
                    .ok_or_else(|| GovernanceError::InvalidAddress(payment.address.clone()))?;
                if destination.is_script() {
                    return Err(GovernanceError::ScriptAddressUnsupported(payment.address));
                }
                debug!(
                    target: "gobject",
                    address = %payment.address,
                    amount = payment.amount,
                    "superblock payment"
                );
                Ok(GovernancePayment {
                    proposal_id: payment.proposal_id,
                    script: destination.script(),
                    address: payment.address,
                    amount: payment.amount,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            object_id,
            schedule: PaymentSchedule {
                target_height,
                payments,
            },
            status: AtomicU8::new(SuperblockStatus::Unknown as u8),
        })
    }

    /// Backing governance object
    pub fn object_id(&self) -> GovernanceObjectId {
        self.object_id
    }

    /// Height the payments are due at
    pub fn target_height(&self) -> i64 {
        self.schedule.target_height
    }

    /// Payment schedule
    pub fn schedule(&self) -> &PaymentSchedule {
        &self.schedule
    }

    /// Payments in mandated order
    pub fn payments(&self) -> &[GovernancePayment] {
        &self.schedule.payments
    }

    /// Sum of all payments, `None` on overflow
    pub fn total_amount(&self) -> Option<Amount> {
        self.schedule.total()
    }

    /// Payments rendered as coinbase outputs
    pub fn outputs(&self) -> Vec<TxOut> {
        self.payments()
            .iter()
            .map(|p| TxOut::new(p.amount, p.script.clone()))
            .collect()
    }

    /// Current status
    pub fn status(&self) -> SuperblockStatus {
        SuperblockStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Replace the status
    pub fn set_status(&self, status: SuperblockStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Mark as paid out
    pub fn set_executed(&self) {
        self.set_status(SuperblockStatus::Executed);
    }

    /// Check a coinbase transaction against this schedule
    ///
    /// Mandated payments must appear as an order-preserving subsequence of
    /// the outputs. Each match consumes its output and the search never
    /// moves backwards.
    pub fn is_valid(
        &self,
        tx: &Transaction,
        height: i64,
        block_reward: Amount,
        chain: &dyn ChainStateProvider,
    ) -> bool {
        if !is_valid_block_height(chain.superblock_params(), height) {
            warn!(target: "gobject", height, "block invalid, incorrect superblock height");
            return false;
        }

        let outputs = &tx.outputs;
        let payments = self.payments();
        if outputs.len() < payments.len() {
            warn!(
                target: "gobject",
                height,
                outputs = outputs.len(),
                payments = payments.len(),
                "block invalid, too few superblock payments"
            );
            return false;
        }

        let Some(total) = self.total_amount() else {
            warn!(target: "gobject", height, "block invalid, payments total overflows");
            return false;
        };
        let limit = payments_limit(chain, height);
        if total > limit {
            warn!(
                target: "gobject",
                height,
                payments = total,
                limit,
                "block invalid, payments limit exceeded"
            );
            return false;
        }

        let block_value = tx.value_out();
        let value_limit = block_reward.checked_add(total);
        match (block_value, value_limit) {
            (Some(value), Some(max)) if value <= max => {}
            _ => {
                warn!(
                    target: "gobject",
                    height,
                    block = ?block_value,
                    limit = ?value_limit,
                    "block invalid, block value limit exceeded"
                );
                return false;
            }
        }

        let mut cursor = 0usize;
        for (index, payment) in payments.iter().enumerate() {
            let found = outputs
                .iter()
                .skip(cursor)
                .position(|out| out.script_pubkey == payment.script && out.value == payment.amount);
            match found {
                Some(offset) => cursor += offset + 1,
                None => {
                    warn!(
                        target: "gobject",
                        height,
                        index,
                        amount = payment.amount,
                        address = %payment.address,
                        "block invalid, superblock payment not found"
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Blocks this trigger is retained past its target height
    pub fn expiration_blocks(&self, expiration: &ExpirationConfig, cycle_length: i64) -> i64 {
        match self.status() {
            SuperblockStatus::Executed => cycle_length,
            SuperblockStatus::Valid => expiration.valid_trigger_blocks,
            _ => expiration.default_blocks,
        }
    }

    /// Whether the retention window has passed
    ///
    /// An expired trigger's backing object is flagged expired with
    /// deletion time `now`.
    pub fn is_expired(
        &self,
        view: &mut dyn GovernanceView,
        expiration: &ExpirationConfig,
        cycle_length: i64,
        now: i64,
    ) -> bool {
        let expiration_block = self
            .target_height()
            .saturating_add(self.expiration_blocks(expiration, cycle_length));
        let current = view.cached_block_height();
        debug!(
            target: "gobject",
            height = self.target_height(),
            expiration_block,
            current,
            "trigger expiry check"
        );
        if current <= expiration_block {
            return false;
        }
        if let Some(object) = view.find_mut(&self.object_id) {
            debug!(target: "gobject", id = %self.object_id, "expiring outdated trigger object");
            object.mark_expired(now);
        }
        true
    }
}
