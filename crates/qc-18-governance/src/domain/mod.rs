//! Domain layer - Pure governance and superblock logic
//!
//! Nothing here performs I/O or takes a lock. Collaborators are reached
//! through the traits in [`crate::ports`].
//!
//! ## Entities
//!
//! - [`GovernanceObjectId`]: 256-bit object identifier
//! - [`Payment`] / [`PaymentSchedule`]: mandated superblock payments
//! - [`Superblock`]: trigger decoded into a schedule with a lifecycle status
//!
//! ## Services
//!
//! - [`parse_payment_amount`]: strict decimal amount parser
//! - [`ProposalValidator`]: proposal admission checks
//! - [`ProposalDetail`] / [`TriggerDetail`]: version-tolerant decoders
//! - [`check_proposal_tx`]: proposal special transaction checks
//!
//! ## Invariants
//!
//! 1. A superblock's target height is a valid superblock height
//! 2. Schedules are non-empty once constructed
//! 3. Trigger payments are sorted by descending proposal id
//! 4. Untrusted payloads never cause a panic

pub mod amount;
mod entities;
pub mod payload;
mod proposal;
pub mod proposal_tx;
pub mod superblock;
mod trigger;
pub mod validator;

pub use amount::{format_amount, parse_payment_amount};
pub use entities::*;
pub use proposal::ProposalDetail;
pub use proposal_tx::{check_proposal_tx, ProposalTx, ProposalType};
pub use superblock::{
    is_valid_block_height, nearest_superblock_heights, payments_limit, Superblock,
};
pub use trigger::TriggerDetail;
pub use validator::{check_url, ProposalValidator, ValidationStage};
