//! Domain entities for governance and superblocks

use crate::error::GovernanceError;
use primitive_types::U256;
use shared_types::{Amount, Hash, HashWriter, Script};
use std::cmp::Ordering;
use std::fmt;

/// 256-bit governance object identifier
///
/// Stored in internal (little-endian) byte order and rendered as reversed
/// hex, the way block and transaction hashes are displayed. Ordering is
/// numeric, so the display strings sort the same way.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct GovernanceObjectId(pub Hash);

impl GovernanceObjectId {
    /// Wrap raw little-endian bytes
    pub const fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex digits (optionally `0x`-prefixed) in display order
    pub fn from_hex(text: &str) -> Result<Self, GovernanceError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(GovernanceError::InvalidProposalHash(text.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| GovernanceError::InvalidProposalHash(text.to_string()))?;
        bytes.reverse();
        Ok(Self(bytes))
    }

    /// Display-order hex
    pub fn to_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }

    /// Numeric value of the identifier
    pub fn as_u256(&self) -> U256 {
        U256::from_little_endian(&self.0)
    }
}

impl Ord for GovernanceObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u256().cmp(&other.as_u256())
    }
}

impl PartialOrd for GovernanceObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GovernanceObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for GovernanceObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GovernanceObjectId({})", self.to_hex())
    }
}

/// Kind of governance object held by the store
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GovernanceObjectType {
    /// Funding proposal
    Proposal,
    /// Superblock trigger
    Trigger,
    /// Any other record kind
    Other,
}

impl GovernanceObjectType {
    /// Wire value of the `type` field
    pub fn wire_value(self) -> i64 {
        match self {
            Self::Proposal => 1,
            Self::Trigger => 2,
            Self::Other => 0,
        }
    }
}

/// Vote categories tallied by the external vote engine
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VoteSignal {
    /// Support for paying out
    Funding,
    /// Object validity
    Valid,
    /// Request to delete
    Delete,
    /// Object has been endorsed
    Endorsed,
}

/// Lifecycle of a superblock trigger
///
/// ```text
/// [UNKNOWN] ──add──→ [VALID] ──execute──→ [EXECUTED]
///     │                 │
///     └─────────────────┴──object gone──→ [INVALID] (reaped)
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SuperblockStatus {
    /// Not yet checked
    Unknown = 0,
    /// Decoded and tracked
    Valid = 1,
    /// Backing object vanished or changed type
    Invalid = 2,
    /// Paid out in an accepted block
    Executed = 3,
}

impl SuperblockStatus {
    /// Decode the atomic representation
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Valid,
            2 => Self::Invalid,
            3 => Self::Executed,
            _ => Self::Unknown,
        }
    }
}

/// Decoded payee of an address
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaymentDestination {
    /// Pay-to-public-key-hash
    KeyHash([u8; 20]),
    /// Pay-to-script-hash (multisig-style)
    ScriptHash([u8; 20]),
}

impl PaymentDestination {
    /// Locking script paying this destination
    pub fn script(&self) -> Script {
        match self {
            Self::KeyHash(id) => Script::pay_to_key_hash(id),
            Self::ScriptHash(id) => Script::pay_to_script_hash(id),
        }
    }

    /// Recover the destination of a standard script
    pub fn from_script(script: &Script) -> Option<Self> {
        script
            .key_hash()
            .map(Self::KeyHash)
            .or_else(|| script.script_hash().map(Self::ScriptHash))
    }

    /// True for script-hash payees
    pub fn is_script(&self) -> bool {
        matches!(self, Self::ScriptHash(_))
    }
}

/// One mandated payment of a schedule
///
/// Ordered by proposal id first; the remaining fields only break ties.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Payment {
    /// Proposal being paid
    pub proposal_id: GovernanceObjectId,
    /// Payee address as text
    pub address: String,
    /// Amount in minor units
    pub amount: Amount,
}

impl Payment {
    /// Create a payment
    pub fn new(proposal_id: GovernanceObjectId, address: impl Into<String>, amount: Amount) -> Self {
        Self {
            proposal_id,
            address: address.into(),
            amount,
        }
    }

    /// Append the canonical serialization to a hash stream
    pub fn write_to(&self, writer: &mut HashWriter) {
        writer
            .write_bytes(&self.proposal_id.0)
            .write_str(&self.address)
            .write_i64(self.amount);
    }
}

/// A payment resolved against the address codec: the script it must pay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernancePayment {
    /// Proposal being paid (zero for legacy schedules without hashes)
    pub proposal_id: GovernanceObjectId,
    /// Payee address as text
    pub address: String,
    /// Locking script the output must carry
    pub script: Script,
    /// Amount in minor units
    pub amount: Amount,
}

/// Height-anchored ordered payments owned by a superblock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSchedule {
    /// Superblock height the payments are due at
    pub target_height: i64,
    /// Payments in mandated order
    pub payments: Vec<GovernancePayment>,
}

impl PaymentSchedule {
    /// Sum of all payments, `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.payments
            .iter()
            .try_fold(0 as Amount, |acc, p| acc.checked_add(p.amount))
    }

    /// Number of payments
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// True when there are no payments
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

/// Which encoding a proposal payload arrived in
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProposalWindow {
    /// Current format: block heights
    Height {
        /// First payment height
        start: i64,
        /// Last payment height
        end: i64,
    },
    /// Legacy format: unix epochs
    Epoch {
        /// Start epoch
        start: i64,
        /// End epoch
        end: i64,
    },
}

impl ProposalWindow {
    /// `(start, end)` regardless of unit
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            Self::Height { start, end } | Self::Epoch { start, end } => (start, end),
        }
    }
}

/// Decoded funding-proposal fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalPayload {
    /// Proposal name
    pub name: String,
    /// Information URL
    pub url: String,
    /// Payee address as text
    pub payment_address: String,
    /// Requested amount in minor units
    pub payment_amount: Amount,
    /// Payment window
    pub window: ProposalWindow,
    /// Produced by the legacy display-unit encoding
    pub legacy_format: bool,
}
