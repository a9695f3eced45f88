//! # QC-18 Governance - Superblock Treasury Subsystem
//!
//! **Subsystem ID:** 18
//!
//! ## Purpose
//!
//! Turns voted governance objects into mandated coinbase payments. Proposals
//! request funding, triggers schedule payments for a superblock height, and
//! block validation checks that the winning trigger's payments appear in the
//! coinbase.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Service                                            │
//! │  - SuperblockManager: winner selection, checks      │
//! │  - TriggerRegistry: tracked triggers, reaping       │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports                                              │
//! │  - Inbound: SuperblockApi                           │
//! │  - Outbound: GovernanceStore, ChainStateProvider,   │
//! │    AddressCodec                                     │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (pure)                                      │
//! │  - Amount parsing, payload decoding                 │
//! │  - ProposalValidator, ProposalDetail, TriggerDetail │
//! │  - Superblock, ProposalTx                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Height**: a superblock exists only at `h >= start && h % cycle == 0`
//! 2. **Budget**: total payments never exceed the cycle's superblock budget
//! 3. **Ordering**: mandated payments appear in order in the coinbase
//! 4. **Winner**: highest funding yes count, ties to the lowest object id
//! 5. **Lock order**: governance store view first, then the registry
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use qc_18_governance::prelude::*;
//!
//! let config = GovernanceConfig::from_env()?;
//! let codec: Arc<dyn AddressCodec> = Arc::new(Base58CheckAddressCodec::new(config.address.clone()));
//! let registry = Arc::new(TriggerRegistry::new(&config, Arc::clone(&codec)));
//! let manager = SuperblockManager::new(store, registry, chain, codec);
//!
//! if manager.is_triggered(height) {
//!     let outputs = manager.superblock_payments(height);
//! }
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::GovernanceConfig;
pub use error::{GovernanceError, Result};
pub use service::{SuperblockManager, TriggerRegistry};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{
        Base58CheckAddressCodec, InMemoryGovernanceStore, MemoryGovernanceObject,
    };
    pub use crate::config::{
        AddressConfig, ExpirationConfig, GovernanceConfig, ProposalLimits, SuperblockParams,
    };
    pub use crate::domain::{
        check_proposal_tx, format_amount, is_valid_block_height, parse_payment_amount,
        GovernanceObjectId, GovernanceObjectType, Payment, ProposalDetail, ProposalTx,
        ProposalValidator, Superblock, SuperblockStatus, TriggerDetail, VoteSignal,
    };
    pub use crate::error::{AmountError, GovernanceError, ProposalTxError};
    pub use crate::ports::{
        AddressCodec, ChainStateProvider, GovernanceObject, GovernanceStore, GovernanceView,
        SuperblockApi,
    };
    pub use crate::service::{SuperblockManager, TriggerRegistry};
    pub use std::sync::Arc;
}

/// Subsystem ID for IPC.
pub const SUBSYSTEM_ID: u8 = 18;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Governance";

/// Mainnet superblock activation height
pub const DEFAULT_SUPERBLOCK_START: i64 = 614_820;

/// Mainnet blocks between superblocks
pub const DEFAULT_SUPERBLOCK_CYCLE: i64 = 16_616;
