//! # Core Chain Entities
//!
//! The value-transfer primitives that cross subsystem boundaries: amounts in
//! minor units, output scripts, and the coinbase-style transaction shape that
//! block validation hands to payment checks.
//!
//! ## Clusters
//!
//! - **Value**: `Amount`, `COIN`, `MAX_MONEY`, `money_range`
//! - **Outputs**: `Script`, `TxOut`, `Transaction`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: VALUE
// =============================================================================

/// A 32-byte hash (double SHA-256).
pub type Hash = [u8; 32];

/// A signed amount in minor units.
///
/// Signed so that intermediate sums and differences can be range-checked
/// instead of silently wrapping.
pub type Amount = i64;

/// Number of minor units in one display unit.
pub const COIN: Amount = 100_000_000;

/// Upper bound on any single amount or sum of amounts.
pub const MAX_MONEY: Amount = 21_000_000 * COIN;

/// Number of fractional digits in a display-unit amount.
pub const COIN_DECIMALS: u32 = 8;

/// Returns true if `value` lies within `[0, MAX_MONEY]`.
pub fn money_range(value: Amount) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

// =============================================================================
// CLUSTER B: OUTPUTS
// =============================================================================

/// Opcodes used by the standard payment scripts.
pub mod opcodes {
    pub const OP_DUP: u8 = 0x76;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_CHECKSIG: u8 = 0xac;
    /// Push of exactly 20 bytes.
    pub const PUSH_20: u8 = 0x14;
}

/// A locking script attached to a transaction output.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Script(#[serde_as(as = "Bytes")] pub Vec<u8>);

impl Script {
    /// Pay-to-public-key-hash script for a 20-byte key id.
    pub fn pay_to_key_hash(key_id: &[u8; 20]) -> Self {
        use opcodes::*;
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, PUSH_20]);
        bytes.extend_from_slice(key_id);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    /// Pay-to-script-hash script for a 20-byte script id.
    pub fn pay_to_script_hash(script_id: &[u8; 20]) -> Self {
        use opcodes::*;
        let mut bytes = Vec::with_capacity(23);
        bytes.extend_from_slice(&[OP_HASH160, PUSH_20]);
        bytes.extend_from_slice(script_id);
        bytes.push(OP_EQUAL);
        Self(bytes)
    }

    /// Returns the key id if this is a standard pay-to-public-key-hash script.
    pub fn key_hash(&self) -> Option<[u8; 20]> {
        use opcodes::*;
        match self.0.as_slice() {
            [OP_DUP, OP_HASH160, PUSH_20, id @ .., OP_EQUALVERIFY, OP_CHECKSIG] if id.len() == 20 => {
                id.try_into().ok()
            }
            _ => None,
        }
    }

    /// Returns the script id if this is a standard pay-to-script-hash script.
    pub fn script_hash(&self) -> Option<[u8; 20]> {
        use opcodes::*;
        match self.0.as_slice() {
            [OP_HASH160, PUSH_20, id @ .., OP_EQUAL] if id.len() == 20 => id.try_into().ok(),
            _ => None,
        }
    }

    /// Raw script bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A transaction output: value locked by a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Output value in minor units.
    pub value: Amount,
    /// Locking script.
    pub script_pubkey: Script,
}

impl TxOut {
    /// Create a new output.
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

/// The output side of a transaction as seen by payment validation.
///
/// Block validation hands the coinbase transaction to superblock checks;
/// only the outputs matter there.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction outputs in order.
    pub outputs: Vec<TxOut>,
}

impl Transaction {
    /// Create a transaction from its outputs.
    pub fn new(outputs: Vec<TxOut>) -> Self {
        Self { outputs }
    }

    /// Sum of all output values.
    ///
    /// Returns `None` if any output or the running total leaves the money range.
    pub fn value_out(&self) -> Option<Amount> {
        self.outputs.iter().try_fold(0 as Amount, |total, out| {
            if !money_range(out.value) {
                return None;
            }
            let next = total.checked_add(out.value)?;
            money_range(next).then_some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_range_bounds() {
        assert!(money_range(0));
        assert!(money_range(MAX_MONEY));
        assert!(!money_range(-1));
        assert!(!money_range(MAX_MONEY + 1));
    }

    #[test]
    fn test_key_hash_script_roundtrip() {
        let id = [7u8; 20];
        let script = Script::pay_to_key_hash(&id);
        assert_eq!(script.as_bytes().len(), 25);
        assert_eq!(script.key_hash(), Some(id));
        assert_eq!(script.script_hash(), None);
    }

    #[test]
    fn test_script_hash_script_roundtrip() {
        let id = [9u8; 20];
        let script = Script::pay_to_script_hash(&id);
        assert_eq!(script.as_bytes().len(), 23);
        assert_eq!(script.script_hash(), Some(id));
        assert_eq!(script.key_hash(), None);
    }

    #[test]
    fn test_value_out_sums_outputs() {
        let tx = Transaction::new(vec![
            TxOut::new(5 * COIN, Script::default()),
            TxOut::new(3 * COIN, Script::default()),
        ]);
        assert_eq!(tx.value_out(), Some(8 * COIN));
    }

    #[test]
    fn test_value_out_rejects_out_of_range() {
        let tx = Transaction::new(vec![
            TxOut::new(MAX_MONEY, Script::default()),
            TxOut::new(1, Script::default()),
        ]);
        assert_eq!(tx.value_out(), None);

        let negative = Transaction::new(vec![TxOut::new(-1, Script::default())]);
        assert_eq!(negative.value_out(), None);
    }
}
