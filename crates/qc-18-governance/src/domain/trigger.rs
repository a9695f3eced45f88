//! Consolidated trigger payment schedules

use super::entities::{GovernanceObjectType, Payment};
use super::payload::{decode_trigger, encode_payload, PaymentWire, TriggerWire};
use super::proposal::ProposalDetail;
use crate::ports::GovernanceObject;
use shared_types::{Hash, HashWriter};
use tracing::debug;

/// Height-anchored payment schedule carried by a trigger
///
/// Payments are kept sorted by descending proposal id so that nodes
/// building a trigger from the same proposals agree on its bytes.
#[derive(Clone, Debug, Default)]
pub struct TriggerDetail {
    height: i64,
    payments: Vec<Payment>,
    parsed: bool,
    errors: Vec<String>,
}

impl TriggerDetail {
    /// Decode a consolidated or legacy pipe-delimited trigger payload
    pub fn from_hex(hex_data: &str) -> Self {
        let mut detail = Self::default();
        if hex_data.is_empty() {
            return detail;
        }
        match decode_trigger(hex_data, true) {
            Ok((height, payments)) => {
                detail.height = height;
                detail.payments = payments;
                detail.sort_payments();
                detail.parsed = true;
            }
            Err(e) => {
                debug!(target: "gobject", "trigger decode failed: {}", e);
                detail.errors.push(e.to_string());
            }
        }
        detail
    }

    /// Build a schedule paying each proposal at `height`
    ///
    /// The first proposal that fails to decode aborts construction and its
    /// errors are recorded; no partial schedule is kept.
    pub fn from_proposals(height: i64, proposals: &[&dyn GovernanceObject]) -> Self {
        let mut detail = Self {
            height,
            ..Self::default()
        };
        for object in proposals {
            let proposal = ProposalDetail::from_hex(object.payload_hex());
            if !proposal.did_parse() {
                detail.errors.push(proposal.error_messages());
                return detail;
            }
            detail.payments.push(Payment::new(
                object.id(),
                proposal.address(),
                proposal.amount(),
            ));
        }
        detail.sort_payments();
        detail.parsed = true;
        detail
    }

    fn sort_payments(&mut self) {
        self.payments.sort_by(|a, b| b.cmp(a));
    }

    /// True if the schedule decoded
    pub fn did_parse(&self) -> bool {
        self.parsed
    }

    /// Accumulated decode errors joined with `;`
    pub fn error_messages(&self) -> String {
        self.errors.join(";")
    }

    /// Superblock height
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Payments in canonical order
    pub fn payments(&self) -> &[Payment] {
        if self.parsed {
            &self.payments
        } else {
            &[]
        }
    }

    /// Content hash over the height and the ordered payments
    pub fn hash(&self) -> Hash {
        let mut writer = HashWriter::new();
        writer.write_i64(self.height);
        for payment in self.payments() {
            payment.write_to(&mut writer);
        }
        writer.finish()
    }

    /// Hex-encoded modern trigger payload
    pub fn data_hex(&self) -> String {
        let wire = TriggerWire {
            sb_height: self.height,
            object_type: GovernanceObjectType::Trigger.wire_value(),
            payments: self
                .payments()
                .iter()
                .map(|p| PaymentWire {
                    address: p.address.clone(),
                    amount: p.amount,
                    prop_hash: p.proposal_id.to_hex(),
                })
                .collect(),
        };
        encode_payload(&wire)
    }
}
