//! Adapters for the outbound ports
//!
//! - [`InMemoryGovernanceStore`]: governance object store kept in memory
//! - [`Base58CheckAddressCodec`]: Base58Check address encoding

mod address;
mod memory;

pub use address::Base58CheckAddressCodec;
pub use memory::{InMemoryGovernanceStore, MemoryGovernanceObject, MemoryGovernanceView};
