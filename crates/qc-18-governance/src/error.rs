//! Error types for the governance subsystem

use shared_types::Amount;
use thiserror::Error;

/// Result type alias for governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Rejections produced by the payment amount parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Empty input
    #[error("ParsePaymentAmount: Amount is empty")]
    Empty,

    /// More than 20 characters
    #[error("ParsePaymentAmount: Amount string too long")]
    TooLong,

    /// A character outside `[0-9.]`
    #[error("ParsePaymentAmount: Amount string contains invalid character")]
    InvalidCharacter,

    /// Leading decimal point
    #[error("ParsePaymentAmount: Invalid amount string, leading decimal point not allowed")]
    LeadingDecimalPoint,

    /// More than one decimal point
    #[error("ParsePaymentAmount: Invalid amount string, too many decimal points")]
    TooManyDecimalPoints,

    /// Fixed-point conversion at 8 fractional digits failed
    #[error("ParsePaymentAmount: ParseFixedPoint failed for string: {0}")]
    FixedPoint(String),

    /// Value outside `[0, MAX_MONEY]`
    #[error("ParsePaymentAmount: Invalid amount string, value outside of valid money range")]
    OutOfRange,
}

/// Errors raised while decoding or checking governance payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Payload is not valid hex
    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),

    /// Payload bytes are not valid JSON
    #[error("JSON parse error: {0}")]
    InvalidJson(String),

    /// Top-level JSON value is not an object
    #[error("Parse error - object expected")]
    ObjectExpected,

    /// Required key absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Key present with the wrong JSON type
    #[error("Field {field} has wrong type, expected {expected}")]
    WrongType {
        /// Field name
        field: &'static str,
        /// Expected JSON type
        expected: &'static str,
    },

    /// Neither the height-keyed nor the epoch-keyed proposal keys were found
    #[error("unrecognized proposal format")]
    UnrecognizedProposalFormat,

    /// No `sbHeight` or `event_block_height` key
    #[error("Missing superblock height")]
    MissingSuperblockHeight,

    /// Amount string rejected
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Amount conversion overflowed
    #[error("Arithmetic overflow converting amount {0}")]
    ArithmeticOverflow(String),

    /// Amount outside the money range
    #[error("Amount {0} outside of valid money range")]
    AmountOutOfRange(Amount),

    /// Legacy `|`-delimited lists disagree in length
    #[error("Mismatched payments, amounts, and/or proposal hashes: {addresses} addresses, {amounts} amounts, {hashes} hashes")]
    MismatchedLists {
        /// Number of addresses
        addresses: usize,
        /// Number of amounts
        amounts: usize,
        /// Number of proposal hashes
        hashes: usize,
    },

    /// Superblock `|`-delimited addresses and amounts disagree in length
    #[error("Mismatched payments and amounts: {addresses} addresses, {amounts} amounts")]
    MismatchedAmounts {
        /// Number of addresses
        addresses: usize,
        /// Number of amounts
        amounts: usize,
    },

    /// Payment schedule is empty
    #[error("Error no payments")]
    NoPayments,

    /// Proposal identifier is not 64 hex digits
    #[error("Invalid proposal hash: {0}")]
    InvalidProposalHash(String),

    /// Address failed to decode
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Script-hash payees are not supported
    #[error("Script addresses are not supported yet: {0}")]
    ScriptAddressUnsupported(String),

    /// Governance object not in the store
    #[error("Failed to find Governance Object {0}")]
    ObjectNotFound(String),

    /// Governance object exists but is not a trigger
    #[error("Governance Object {0} not a trigger")]
    NotATrigger(String),

    /// Height is not a superblock height under the cycle parameters
    #[error("Invalid superblock height {0}")]
    InvalidSuperblockHeight(i64),

    /// Trigger id already tracked
    #[error("Trigger already tracked: {0}")]
    DuplicateTrigger(String),
}

impl GovernanceError {
    /// Check if error originates from malformed network input
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidHex(_)
                | Self::InvalidJson(_)
                | Self::ObjectExpected
                | Self::MissingField(_)
                | Self::WrongType { .. }
                | Self::UnrecognizedProposalFormat
                | Self::MissingSuperblockHeight
                | Self::Amount(_)
                | Self::ArithmeticOverflow(_)
                | Self::AmountOutOfRange(_)
                | Self::MismatchedLists { .. }
                | Self::MismatchedAmounts { .. }
                | Self::InvalidProposalHash(_)
        )
    }
}

/// Reject reasons for proposal special transactions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalTxError {
    /// Payload failed to deserialize
    #[error("bad-proptx-payload")]
    BadPayload,

    /// Unsupported payload version
    #[error("bad-proptx-version")]
    BadVersion,

    /// Payload height does not follow the previous block
    #[error("bad-proptx-height")]
    BadHeight,

    /// Start height is not a cycle boundary
    #[error("bad-proptx-start-height")]
    BadStartHeight,

    /// Zero payment periods
    #[error("bad-proptx-periods")]
    BadPeriods,

    /// End height is not a cycle boundary or overflows
    #[error("bad-proptx-end-height")]
    BadEndHeight,

    /// Amount not positive or above the budget for the start height
    #[error("bad-proptx-amount")]
    BadAmount,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Cycle length of zero
    #[error("Invalid configuration: superblock cycle length must be positive")]
    ZeroCycleLength,

    /// Negative activation height
    #[error("Invalid configuration: superblock activation height {0} is negative")]
    NegativeActivationHeight(i64),

    /// Payment amount bounds inverted
    #[error("Invalid configuration: min payment amount exceeds max")]
    InvertedAmountBounds,

    /// Environment override not parseable
    #[error("Invalid configuration: {key}={value}")]
    InvalidOverride {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_classification() {
        assert!(GovernanceError::ObjectExpected.is_malformed_input());
        assert!(GovernanceError::Amount(AmountError::Empty).is_malformed_input());
        assert!(GovernanceError::MismatchedLists {
            addresses: 2,
            amounts: 1,
            hashes: 2
        }
        .is_malformed_input());
        assert!(!GovernanceError::NotATrigger("00".into()).is_malformed_input());
        assert!(!GovernanceError::InvalidSuperblockHeight(7).is_malformed_input());
    }

    #[test]
    fn test_amount_error_is_transparent() {
        let err: GovernanceError = AmountError::TooManyDecimalPoints.into();
        assert!(err.to_string().contains("too many decimal points"));
    }

    #[test]
    fn test_proposal_tx_reject_codes() {
        assert_eq!(ProposalTxError::BadAmount.to_string(), "bad-proptx-amount");
        assert_eq!(
            ProposalTxError::BadStartHeight.to_string(),
            "bad-proptx-start-height"
        );
    }
}
