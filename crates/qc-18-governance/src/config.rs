//! Configuration types for the governance subsystem

use crate::error::ConfigError;
use primitive_types::U256;
use serde::Deserialize;

/// Runtime configuration for governance and superblock handling
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Superblock cycle parameters (consensus)
    pub superblock: SuperblockParams,

    /// Trigger retention windows
    pub expiration: ExpirationConfig,

    /// Address version bytes
    pub address: AddressConfig,

    /// Proposal admission limits
    pub proposal: ProposalLimits,
}

impl GovernanceConfig {
    /// Reject configurations that would make every height ambiguous
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.superblock.cycle_length <= 0 {
            return Err(ConfigError::ZeroCycleLength);
        }
        if self.superblock.activation_height < 0 {
            return Err(ConfigError::NegativeActivationHeight(
                self.superblock.activation_height,
            ));
        }
        if self.proposal.min_payment_amount > self.proposal.max_payment_amount {
            return Err(ConfigError::InvertedAmountBounds);
        }
        Ok(())
    }

    /// Load defaults, then apply `QC_GOV_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("QC_GOV_SUPERBLOCK_START") {
            config.superblock.activation_height =
                val.parse().map_err(|_| ConfigError::InvalidOverride {
                    key: "QC_GOV_SUPERBLOCK_START",
                    value: val.clone(),
                })?;
        }
        if let Ok(val) = std::env::var("QC_GOV_SUPERBLOCK_CYCLE") {
            config.superblock.cycle_length =
                val.parse().map_err(|_| ConfigError::InvalidOverride {
                    key: "QC_GOV_SUPERBLOCK_CYCLE",
                    value: val.clone(),
                })?;
        }
        if let Ok(val) = std::env::var("QC_GOV_ALLOW_MIN_DIFFICULTY") {
            config.superblock.allow_min_difficulty_blocks =
                val == "1" || val.to_lowercase() == "true";
        }

        config.validate()?;
        Ok(config)
    }
}

/// Superblock consensus parameters
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SuperblockParams {
    /// First height at which superblocks may occur
    pub activation_height: i64,

    /// Blocks between superblocks
    pub cycle_length: i64,

    /// Network accepts minimum-difficulty blocks (test networks)
    pub allow_min_difficulty_blocks: bool,

    /// Proof-of-work limit, used as the difficulty when min-difficulty is allowed
    pub pow_limit: U256,
}

impl Default for SuperblockParams {
    fn default() -> Self {
        Self {
            activation_height: crate::DEFAULT_SUPERBLOCK_START,
            cycle_length: crate::DEFAULT_SUPERBLOCK_CYCLE,
            allow_min_difficulty_blocks: false,
            pow_limit: U256::MAX >> 20,
        }
    }
}

/// How long triggers are retained after their target height
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// Blocks a valid, unexecuted trigger survives (~1 day)
    pub valid_trigger_blocks: i64,

    /// Blocks any other non-executed trigger survives (~1 hour)
    pub default_blocks: i64,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            valid_trigger_blocks: 576,
            default_blocks: 24,
        }
    }
}

/// Base58Check version bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Version byte of pay-to-key-hash addresses
    pub pubkey_prefix: u8,

    /// Version byte of pay-to-script-hash addresses
    pub script_prefix: u8,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            pubkey_prefix: 76,
            script_prefix: 16,
        }
    }
}

/// Field limits applied at proposal admission
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProposalLimits {
    /// Maximum name length in bytes
    pub max_name_len: usize,

    /// Minimum URL length after trimming whitespace
    pub min_url_len: usize,

    /// Smallest accepted payment amount in display units
    pub min_payment_amount: f64,

    /// Largest accepted payment amount in display units
    pub max_payment_amount: f64,
}

impl Default for ProposalLimits {
    fn default() -> Self {
        Self {
            max_name_len: 40,
            min_url_len: 4,
            min_payment_amount: 0.000_000_01,
            max_payment_amount: 6652.0,
        }
    }
}
