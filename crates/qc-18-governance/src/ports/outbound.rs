//! Outbound ports (driven side - collaborators)
//!
//! The governance-object store, chain state and address encoding are owned
//! by other subsystems. The superblock core only sees them through these
//! traits.

use crate::config::SuperblockParams;
use crate::domain::{GovernanceObjectId, GovernanceObjectType, PaymentDestination, VoteSignal};
use shared_types::Amount;

/// A voted-upon record held by the governance object store
pub trait GovernanceObject: Send + Sync {
    /// Object identifier
    fn id(&self) -> GovernanceObjectId;

    /// Kind of object
    fn object_type(&self) -> GovernanceObjectType;

    /// Hex-encoded JSON payload as gossiped
    fn payload_hex(&self) -> &str;

    /// Absolute yes count for a vote signal (yes minus no)
    fn absolute_yes_count(&self, signal: VoteSignal) -> i64;

    /// Recompute cached vote flags from the live tally
    fn update_sentinel_variables(&mut self);

    /// Cached funding flag as of the last sentinel update
    fn is_cached_funding(&self) -> bool;

    /// Request deletion; keeps an earlier deletion time if already set
    fn mark_deleted(&mut self, timestamp: i64);

    /// Flag the object as expired with a deletion time
    fn mark_expired(&mut self, timestamp: i64);
}

/// Exclusive access to the governance store, held for the duration of a query
///
/// Registry operations take a view so that the store lock is always taken
/// before the registry lock.
pub trait GovernanceView {
    /// Look up an object
    fn find(&self, id: &GovernanceObjectId) -> Option<&dyn GovernanceObject>;

    /// Look up an object for mutation
    fn find_mut(&mut self, id: &GovernanceObjectId) -> Option<&mut dyn GovernanceObject>;

    /// Chain height last seen by the store
    fn cached_block_height(&self) -> i64;
}

/// Governance object store with its lock
pub trait GovernanceStore: Send + Sync {
    /// Guard type granting a view while held
    type View<'a>: GovernanceView
    where
        Self: 'a;

    /// Acquire the governance lock
    fn lock(&self) -> Self::View<'_>;
}

/// Consensus parameters, subsidy schedule and network time
pub trait ChainStateProvider: Send + Sync {
    /// Superblock consensus parameters
    fn superblock_params(&self) -> &SuperblockParams;

    /// Block subsidy for a block at `height` mined with compact difficulty `bits`
    ///
    /// With `superblock_part_only` the share reserved for superblocks is
    /// returned instead of the miner subsidy.
    fn block_subsidy(&self, bits: u32, height: i64, superblock_part_only: bool) -> Amount;

    /// Network-adjusted unix time
    fn adjusted_time(&self) -> i64;
}

/// Textual address encoding
pub trait AddressCodec: Send + Sync {
    /// Decode and validate an address
    fn decode(&self, address: &str) -> Option<PaymentDestination>;

    /// Render a destination as an address
    fn encode(&self, destination: &PaymentDestination) -> String;

    /// True if `address` decodes to a script-hash payee
    fn is_script_address(&self, address: &str) -> bool {
        self.decode(address).is_some_and(|d| d.is_script())
    }

    /// Address paid by a standard script
    fn extract_address(&self, script: &shared_types::Script) -> Option<String> {
        PaymentDestination::from_script(script).map(|d| self.encode(&d))
    }
}
