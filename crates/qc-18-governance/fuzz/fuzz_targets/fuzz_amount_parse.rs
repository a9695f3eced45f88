//! Fuzz target for the payment amount parser.
//!
//! ## Running
//!
//! ```bash
//! cd crates/qc-18-governance
//! cargo +nightly fuzz run fuzz_amount_parse
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use qc_18_governance::domain::{format_amount, parse_payment_amount};

fuzz_target!(|text: &str| {
    // Must never panic, whatever the text
    let first = parse_payment_amount(text);
    assert_eq!(first, parse_payment_amount(text));

    // Accepted amounts survive rendering
    if let Ok(amount) = first {
        assert_eq!(parse_payment_amount(&format_amount(amount)), Ok(amount));
    }
});
