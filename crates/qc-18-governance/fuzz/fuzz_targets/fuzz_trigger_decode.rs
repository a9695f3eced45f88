//! Fuzz target for trigger payload decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qc_18_governance::domain::TriggerDetail;

fuzz_target!(|payload: &[u8]| {
    let detail = TriggerDetail::from_hex(&hex::encode(payload));

    if detail.did_parse() {
        // Sorted by descending proposal id
        assert!(detail
            .payments()
            .windows(2)
            .all(|pair| pair[0].proposal_id >= pair[1].proposal_id));

        // Re-encoding yields the same schedule
        let reencoded = TriggerDetail::from_hex(&detail.data_hex());
        assert!(reencoded.did_parse());
        assert_eq!(reencoded.hash(), detail.hash());
    } else {
        assert!(detail.payments().is_empty());
    }
});
