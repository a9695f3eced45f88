//! Wire payload decoding
//!
//! Governance payloads travel as hex-encoded JSON. Several historical
//! encodings are still on the network; each is detected up front by key
//! presence and then decoded through its own typed structure.
//!
//! | Kind     | Encoding            | Detected by                       |
//! |----------|---------------------|-----------------------------------|
//! | proposal | height keyed        | `startHeight`                     |
//! | proposal | epoch keyed         | `start_epoch`                     |
//! | trigger  | consolidated array  | `payments`                        |
//! | trigger  | legacy pipe lists   | `payment_addresses` and friends   |

use super::amount::{amount_from_display, parse_payment_amount};
use super::entities::{GovernanceObjectId, Payment, ProposalPayload, ProposalWindow};
use crate::error::{GovernanceError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::{money_range, Amount};

/// Decoded top-level JSON object
pub type JsonObject = Map<String, Value>;

/// Hex-decode a payload and parse it as a JSON object
///
/// The historical `[["proposal", {...}]]` wrapper is unwrapped.
pub fn decode_payload(hex_data: &str) -> Result<JsonObject> {
    let bytes =
        hex::decode(hex_data.trim()).map_err(|e| GovernanceError::InvalidHex(e.to_string()))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| GovernanceError::InvalidJson(e.to_string()))?;
    match unwrap_legacy_envelope(value) {
        Value::Object(map) => Ok(map),
        _ => Err(GovernanceError::ObjectExpected),
    }
}

fn unwrap_legacy_envelope(value: Value) -> Value {
    if let Value::Array(outer) = &value {
        if let [Value::Array(inner)] = outer.as_slice() {
            if let [Value::String(_), object @ Value::Object(_)] = inner.as_slice() {
                return object.clone();
            }
        }
    }
    value
}

/// Split a `|`-delimited list, dropping empty parts
pub fn split_by_pipe(text: &str) -> Vec<&str> {
    text.split('|').filter(|part| !part.is_empty()).collect()
}

fn from_object<T: DeserializeOwned>(obj: &JsonObject) -> Result<T> {
    T::deserialize(Value::Object(obj.clone()))
        .map_err(|e| GovernanceError::InvalidJson(e.to_string()))
}

// =============================================================================
// PROPOSALS
// =============================================================================

/// Current proposal encoding: heights and minor units
#[derive(Clone, Debug, Deserialize)]
pub struct HeightKeyedProposal {
    /// First payment height
    #[serde(rename = "startHeight")]
    pub start_height: i64,
    /// Last payment height
    #[serde(rename = "endHeight")]
    pub end_height: i64,
    /// Proposal name
    pub name: String,
    /// Information URL
    pub url: String,
    /// Payee address
    pub payment_address: String,
    /// Amount in minor units
    pub payment_amount: i64,
}

/// Legacy proposal encoding: epochs and display units
#[derive(Clone, Debug, Deserialize)]
pub struct EpochKeyedProposal {
    /// Start epoch
    pub start_epoch: i64,
    /// End epoch
    pub end_epoch: i64,
    /// Proposal name
    pub name: String,
    /// Information URL
    pub url: String,
    /// Payee address
    pub payment_address: String,
    /// Amount in display units
    pub payment_amount: f64,
}

/// Detected proposal encoding
#[derive(Clone, Debug)]
pub enum ProposalEncoding {
    /// `startHeight` present
    HeightKeyed(HeightKeyedProposal),
    /// `start_epoch` present
    EpochKeyed(EpochKeyedProposal),
}

impl ProposalEncoding {
    /// Detect the encoding by key presence, height keys first
    pub fn detect(obj: &JsonObject) -> Result<Self> {
        if obj.contains_key("startHeight") {
            from_object(obj).map(Self::HeightKeyed)
        } else if obj.contains_key("start_epoch") {
            from_object(obj).map(Self::EpochKeyed)
        } else {
            Err(GovernanceError::UnrecognizedProposalFormat)
        }
    }

    /// Normalize to a proposal payload in minor units
    pub fn into_payload(self) -> Result<ProposalPayload> {
        match self {
            Self::HeightKeyed(p) => Ok(ProposalPayload {
                name: p.name,
                url: p.url,
                payment_address: p.payment_address,
                payment_amount: checked_amount(p.payment_amount)?,
                window: ProposalWindow::Height {
                    start: p.start_height,
                    end: p.end_height,
                },
                legacy_format: false,
            }),
            Self::EpochKeyed(p) => Ok(ProposalPayload {
                name: p.name,
                url: p.url,
                payment_address: p.payment_address,
                payment_amount: amount_from_display(p.payment_amount)?,
                window: ProposalWindow::Epoch {
                    start: p.start_epoch,
                    end: p.end_epoch,
                },
                legacy_format: true,
            }),
        }
    }
}

/// Decode a proposal from its hex payload
pub fn decode_proposal(hex_data: &str) -> Result<ProposalPayload> {
    let obj = decode_payload(hex_data)?;
    ProposalEncoding::detect(&obj)?.into_payload()
}

fn checked_amount(amount: Amount) -> Result<Amount> {
    if money_range(amount) {
        Ok(amount)
    } else {
        Err(GovernanceError::AmountOutOfRange(amount))
    }
}

// =============================================================================
// TRIGGERS
// =============================================================================

/// One entry of the consolidated `payments` array
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWire {
    /// Payee address
    pub address: String,
    /// Amount in minor units
    pub amount: i64,
    /// Proposal identifier, display hex
    #[serde(rename = "propHash")]
    pub prop_hash: String,
}

/// Modern trigger payload as written to the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TriggerWire {
    /// Superblock height
    #[serde(rename = "sbHeight")]
    pub sb_height: i64,
    /// Object type, always 2
    #[serde(rename = "type")]
    pub object_type: i64,
    /// Payments in canonical order
    pub payments: Vec<PaymentWire>,
}

/// Legacy trigger payload: three parallel `|`-delimited lists
#[derive(Clone, Debug, Deserialize)]
pub struct LegacyPipeTrigger {
    /// Payee addresses
    pub payment_addresses: String,
    /// Amounts in display units
    pub payment_amounts: String,
    /// Proposal identifiers (absent in the oldest superblock objects)
    #[serde(default)]
    pub proposal_hashes: Option<String>,
}

#[derive(Deserialize)]
struct ConsolidatedTrigger {
    payments: Vec<PaymentWire>,
}

/// Detected trigger encoding
#[derive(Clone, Debug)]
pub enum TriggerEncoding {
    /// `payments` array present
    ConsolidatedArray(Vec<PaymentWire>),
    /// Pipe-delimited string lists
    LegacyPipe(LegacyPipeTrigger),
}

impl TriggerEncoding {
    /// Detect the encoding by key presence, consolidated array first
    pub fn detect(obj: &JsonObject) -> Result<Self> {
        if obj.contains_key("payments") {
            let wire: ConsolidatedTrigger = from_object(obj)?;
            Ok(Self::ConsolidatedArray(wire.payments))
        } else {
            from_object(obj).map(Self::LegacyPipe)
        }
    }

    /// Decode into payments, in wire order
    ///
    /// `require_hashes` rejects legacy payloads without `proposal_hashes`.
    pub fn into_payments(self, require_hashes: bool) -> Result<Vec<Payment>> {
        match self {
            Self::ConsolidatedArray(wire) => wire
                .into_iter()
                .map(|p| -> Result<Payment> {
                    Ok(Payment::new(
                        GovernanceObjectId::from_hex(&p.prop_hash)?,
                        p.address,
                        checked_amount(p.amount)?,
                    ))
                })
                .collect(),
            Self::LegacyPipe(legacy) => legacy.into_payments(require_hashes),
        }
    }
}

impl LegacyPipeTrigger {
    fn into_payments(self, require_hashes: bool) -> Result<Vec<Payment>> {
        let addresses = split_by_pipe(&self.payment_addresses);
        let amounts = split_by_pipe(&self.payment_amounts);

        let hashes = match (&self.proposal_hashes, require_hashes) {
            (Some(hashes), _) => Some(split_by_pipe(hashes)),
            (None, true) => return Err(GovernanceError::MissingField("proposal_hashes")),
            (None, false) => None,
        };

        match &hashes {
            Some(hashes) if addresses.len() != amounts.len() || amounts.len() != hashes.len() => {
                return Err(GovernanceError::MismatchedLists {
                    addresses: addresses.len(),
                    amounts: amounts.len(),
                    hashes: hashes.len(),
                });
            }
            None if addresses.len() != amounts.len() => {
                return Err(GovernanceError::MismatchedAmounts {
                    addresses: addresses.len(),
                    amounts: amounts.len(),
                });
            }
            _ => {}
        }

        addresses
            .iter()
            .zip(&amounts)
            .enumerate()
            .map(|(i, (address, amount))| -> Result<Payment> {
                let proposal_id = match hashes.as_ref().and_then(|h| h.get(i)) {
                    Some(hash) => GovernanceObjectId::from_hex(hash)?,
                    None => GovernanceObjectId::default(),
                };
                Ok(Payment::new(
                    proposal_id,
                    *address,
                    parse_payment_amount(amount)?,
                ))
            })
            .collect()
    }
}

/// Superblock height: `sbHeight`, else `event_block_height`
pub fn trigger_height(obj: &JsonObject) -> Result<i64> {
    for field in ["sbHeight", "event_block_height"] {
        if let Some(value) = obj.get(field) {
            return value.as_i64().ok_or(GovernanceError::WrongType {
                field,
                expected: "integer",
            });
        }
    }
    Err(GovernanceError::MissingSuperblockHeight)
}

/// Decode height and payments of a trigger payload
pub fn decode_trigger(hex_data: &str, require_hashes: bool) -> Result<(i64, Vec<Payment>)> {
    let obj = decode_payload(hex_data)?;
    let height = trigger_height(&obj)?;
    let payments = TriggerEncoding::detect(&obj)?.into_payments(require_hashes)?;
    Ok((height, payments))
}

/// Hex-encode a JSON value for the wire
pub fn encode_payload<T: Serialize>(value: &T) -> String {
    // Serializing plain structs of strings and integers cannot fail
    hex::encode(serde_json::to_vec(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::COIN;

    const HASH_A: &str = "00000000000000000000000000000000000000000000000000000000000000aa";
    const HASH_B: &str = "00000000000000000000000000000000000000000000000000000000000000bb";

    fn hex_json(value: Value) -> String {
        hex::encode(value.to_string())
    }

    #[test]
    fn test_decode_payload_rejects_bad_input() {
        assert!(matches!(
            decode_payload("zz"),
            Err(GovernanceError::InvalidHex(_))
        ));
        assert!(matches!(
            decode_payload(&hex::encode("{not json")),
            Err(GovernanceError::InvalidJson(_))
        ));
        assert_eq!(
            decode_payload(&hex::encode("[1,2]")),
            Err(GovernanceError::ObjectExpected)
        );
    }

    #[test]
    fn test_decode_payload_unwraps_envelope() {
        let wrapped = hex_json(serde_json::json!([["proposal", {"name": "x"}]]));
        let obj = decode_payload(&wrapped).unwrap();
        assert_eq!(obj.get("name"), Some(&Value::from("x")));
    }

    #[test]
    fn test_split_by_pipe_drops_empty_parts() {
        assert_eq!(split_by_pipe("a||b|"), vec!["a", "b"]);
        assert!(split_by_pipe("").is_empty());
    }

    #[test]
    fn test_height_keyed_wins_over_epoch_keyed() {
        let payload = hex_json(serde_json::json!({
            "startHeight": 100, "endHeight": 200, "start_epoch": 1, "end_epoch": 2,
            "name": "n", "url": "http://x.io", "payment_address": "addr",
            "payment_amount": 5
        }));
        let proposal = decode_proposal(&payload).unwrap();
        assert!(!proposal.legacy_format);
        assert_eq!(proposal.payment_amount, 5);
        assert_eq!(proposal.window, ProposalWindow::Height { start: 100, end: 200 });
    }

    #[test]
    fn test_epoch_keyed_scales_amount() {
        let payload = hex_json(serde_json::json!({
            "start_epoch": 1, "end_epoch": 2, "name": "n", "url": "http://x.io",
            "payment_address": "addr", "payment_amount": 1.15
        }));
        let proposal = decode_proposal(&payload).unwrap();
        assert!(proposal.legacy_format);
        assert_eq!(proposal.payment_amount, 115_000_000);
    }

    #[test]
    fn test_unrecognized_proposal_format() {
        let payload = hex_json(serde_json::json!({"name": "n"}));
        assert_eq!(
            decode_proposal(&payload),
            Err(GovernanceError::UnrecognizedProposalFormat)
        );
    }

    #[test]
    fn test_consolidated_trigger() {
        let payload = hex_json(serde_json::json!({
            "sbHeight": 16616, "type": 2,
            "payments": [{"address": "a", "amount": 7, "propHash": HASH_A}]
        }));
        let (height, payments) = decode_trigger(&payload, true).unwrap();
        assert_eq!(height, 16616);
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].proposal_id.to_hex(), HASH_A);
    }

    #[test]
    fn test_legacy_trigger_lists() {
        let payload = hex_json(serde_json::json!({
            "event_block_height": 33232,
            "payment_addresses": "a|b",
            "payment_amounts": "1|2.5",
            "proposal_hashes": format!("{HASH_A}|{HASH_B}")
        }));
        let (height, payments) = decode_trigger(&payload, true).unwrap();
        assert_eq!(height, 33232);
        assert_eq!(payments[1].amount, 250_000_000);
        assert_eq!(payments[0].amount, COIN);
    }

    #[test]
    fn test_legacy_trigger_mismatched_lists() {
        let payload = hex_json(serde_json::json!({
            "event_block_height": 33232,
            "payment_addresses": "a|b",
            "payment_amounts": "1",
            "proposal_hashes": format!("{HASH_A}|{HASH_B}")
        }));
        assert_eq!(
            decode_trigger(&payload, true),
            Err(GovernanceError::MismatchedLists {
                addresses: 2,
                amounts: 1,
                hashes: 2
            })
        );
    }

    #[test]
    fn test_trigger_without_height() {
        let payload = hex_json(serde_json::json!({"payments": []}));
        assert_eq!(
            decode_trigger(&payload, true),
            Err(GovernanceError::MissingSuperblockHeight)
        );
    }

    #[test]
    fn test_trigger_wire_key_order() {
        let wire = TriggerWire {
            sb_height: 5,
            object_type: 2,
            payments: vec![],
        };
        let json = serde_json::to_string(&wire).unwrap();
        assert_eq!(json, r#"{"sbHeight":5,"type":2,"payments":[]}"#);
    }
}
