//! Inbound ports (driving side - consensus API)

use shared_types::{Amount, Transaction, TxOut};

/// Superblock queries used along the block pipeline
///
/// | Caller                     | Operation                  |
/// |----------------------------|----------------------------|
/// | block template builder     | `is_triggered`             |
/// | coinbase assembly          | `superblock_payments`      |
/// | block acceptance           | `is_valid`                 |
/// | post-acceptance            | `execute_best`             |
/// | status reporting           | `required_payments_string` |
pub trait SuperblockApi: Send + Sync {
    /// True if an active trigger with funding support targets `height`
    fn is_triggered(&self, height: i64) -> bool;

    /// Outputs the coinbase at `height` must carry, in schedule order
    ///
    /// `None` when no trigger wins at `height`.
    fn superblock_payments(&self, height: i64) -> Option<Vec<TxOut>>;

    /// Validate a coinbase against the winning schedule; false without a winner
    fn is_valid(&self, tx: &Transaction, height: i64, block_reward: Amount) -> bool;

    /// Mark the winning trigger executed; returns false without a winner
    ///
    /// Performs no validation. Only call once the block carrying the
    /// payments has been accepted.
    fn execute_best(&self, height: i64) -> bool;

    /// Comma-joined payee addresses of the winning schedule, `"error"` without one
    fn required_payments_string(&self, height: i64) -> String;
}
