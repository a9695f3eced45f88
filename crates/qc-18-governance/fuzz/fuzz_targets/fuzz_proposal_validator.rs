//! Fuzz target for proposal admission.
//!
//! Feeds arbitrary bytes, both raw and as hex, through the validator and
//! the proposal decoder.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qc_18_governance::adapters::Base58CheckAddressCodec;
use qc_18_governance::config::ProposalLimits;
use qc_18_governance::domain::{ProposalDetail, ProposalValidator};

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    /// Payload bytes, hex-encoded before submission
    payload: Vec<u8>,
    /// Raw text submitted as-is
    raw: String,
    /// Clock for the expiration check
    now: i64,
}

fuzz_target!(|input: FuzzInput| {
    let codec = Base58CheckAddressCodec::default();
    let limits = ProposalLimits::default();

    for data in [hex::encode(&input.payload), input.raw] {
        let mut validator = ProposalValidator::new(&codec, &limits);
        validator.set_payload(&data);
        let first = validator.validate_with_expiration(input.now);
        let messages = validator.error_messages().to_string();

        // Deterministic
        let mut again = ProposalValidator::new(&codec, &limits);
        again.set_payload(&data);
        assert_eq!(first, again.validate_with_expiration(input.now));
        assert_eq!(messages, again.error_messages());

        let detail = ProposalDetail::from_hex(&data);
        let _ = detail.hash();
    }
});
