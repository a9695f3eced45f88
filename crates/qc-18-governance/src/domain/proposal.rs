//! Version-tolerant proposal decoding

use super::entities::{ProposalPayload, ProposalWindow};
use super::payload::decode_proposal;
use shared_types::{Amount, Hash, HashWriter};
use tracing::debug;

/// A funding proposal decoded from any supported wire encoding
///
/// Construction never fails: a malformed payload yields a detail with
/// `did_parse() == false` and the reason in `error_messages()`.
#[derive(Clone, Debug, Default)]
pub struct ProposalDetail {
    payload: Option<ProposalPayload>,
    errors: Vec<String>,
}

impl ProposalDetail {
    /// Decode a hex payload; an empty string yields an unparsed detail
    pub fn from_hex(hex_data: &str) -> Self {
        let mut detail = Self::default();
        if hex_data.is_empty() {
            return detail;
        }
        match decode_proposal(hex_data) {
            Ok(payload) => detail.payload = Some(payload),
            Err(e) => {
                debug!(target: "gobject", "proposal decode failed: {}", e);
                detail.errors.push(e.to_string());
            }
        }
        detail
    }

    /// True if the payload decoded
    pub fn did_parse(&self) -> bool {
        self.payload.is_some()
    }

    /// Accumulated decode errors joined with `;`
    pub fn error_messages(&self) -> String {
        self.errors.join(";")
    }

    /// Decoded fields, if any
    pub fn payload(&self) -> Option<&ProposalPayload> {
        self.payload.as_ref()
    }

    /// Proposal name
    pub fn name(&self) -> &str {
        self.payload.as_ref().map_or("", |p| p.name.as_str())
    }

    /// Information URL
    pub fn url(&self) -> &str {
        self.payload.as_ref().map_or("", |p| p.url.as_str())
    }

    /// Payee address
    pub fn address(&self) -> &str {
        self.payload.as_ref().map_or("", |p| p.payment_address.as_str())
    }

    /// Requested amount in minor units
    pub fn amount(&self) -> Amount {
        self.payload.as_ref().map_or(0, |p| p.payment_amount)
    }

    /// Payment window, if decoded
    pub fn window(&self) -> Option<ProposalWindow> {
        self.payload.as_ref().map(|p| p.window)
    }

    /// Whether the legacy display-unit encoding was used
    pub fn legacy_format(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| p.legacy_format)
    }

    /// Content hash over name, url, payee, amount and window
    pub fn hash(&self) -> Hash {
        let (start, end) = self.window().map_or((0, 0), |w| w.bounds());
        let mut writer = HashWriter::new();
        writer
            .write_str(self.name())
            .write_str(self.url())
            .write_str(self.address())
            .write_i64(self.amount())
            .write_i64(start)
            .write_i64(end);
        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: serde_json::Value) -> String {
        hex::encode(value.to_string())
    }

    fn height_keyed() -> serde_json::Value {
        json!({
            "startHeight": 16616, "endHeight": 33232, "name": "dev-fund",
            "url": "http://x.io", "payment_address": "addr", "payment_amount": 250_000_000i64
        })
    }

    #[test]
    fn test_parses_height_keyed() {
        let detail = ProposalDetail::from_hex(&encode(height_keyed()));
        assert!(detail.did_parse());
        assert_eq!(detail.name(), "dev-fund");
        assert_eq!(detail.amount(), 250_000_000);
        assert!(!detail.legacy_format());
        assert_eq!(detail.error_messages(), "");
    }

    #[test]
    fn test_empty_payload_is_unparsed_without_errors() {
        let detail = ProposalDetail::from_hex("");
        assert!(!detail.did_parse());
        assert_eq!(detail.error_messages(), "");
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let mut value = height_keyed();
        value["payment_amount"] = json!("lots");
        let detail = ProposalDetail::from_hex(&encode(value));
        assert!(!detail.did_parse());
        assert!(!detail.error_messages().is_empty());
    }

    #[test]
    fn test_non_object_payload() {
        let detail = ProposalDetail::from_hex(&hex::encode("42"));
        assert_eq!(detail.error_messages(), "Parse error - object expected");
    }

    #[test]
    fn test_hash_covers_fields() {
        let a = ProposalDetail::from_hex(&encode(height_keyed()));
        let mut value = height_keyed();
        value["payment_amount"] = json!(250_000_001i64);
        let b = ProposalDetail::from_hex(&encode(value));
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), ProposalDetail::from_hex(&encode(height_keyed())).hash());
    }
}
