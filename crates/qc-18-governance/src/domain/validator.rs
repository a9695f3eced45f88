//! Proposal admission validation
//!
//! Runs before a proposal is relayed or voted on. Every failure is reported
//! as `;`-terminated text; nothing here panics on submitted data.
//!
//! ```text
//! [Unset] ─set_payload─→ [HexDecoded] ─→ [JsonParsed] ─validate─→ [SchemaChecked] ─→ [FieldChecked]
//! ```

use super::payload::{decode_payload, JsonObject};
use crate::config::ProposalLimits;
use crate::error::GovernanceError;
use crate::ports::AddressCodec;
use serde_json::Value;

/// Upper bound of the epoch fields
const MAX_EPOCH: i64 = u32::MAX as i64;

/// Characters trimmed before emptiness and length checks
const WHITESPACE: &str = " \x0c\n\r\t\x0b";

/// Progress of one payload through admission
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationStage {
    /// No payload
    Unset,
    /// Hex decoded but not valid JSON
    HexDecoded,
    /// JSON object available
    JsonParsed,
    /// Required fields present with the right types
    SchemaChecked,
    /// Field validators ran
    FieldChecked {
        /// Overall outcome
        passed: bool,
    },
}

#[derive(Clone, Debug)]
struct ProposalFields {
    name: String,
    url: String,
    payment_address: String,
    payment_amount: f64,
    start_epoch: i64,
    end_epoch: i64,
}

/// Schema and field checks for a submitted proposal payload
pub struct ProposalValidator<'a> {
    codec: &'a dyn AddressCodec,
    limits: &'a ProposalLimits,
    stage: ValidationStage,
    object: Option<JsonObject>,
    fields: Option<ProposalFields>,
    errors: String,
}

impl<'a> ProposalValidator<'a> {
    /// Create a validator with no payload
    pub fn new(codec: &'a dyn AddressCodec, limits: &'a ProposalLimits) -> Self {
        Self {
            codec,
            limits,
            stage: ValidationStage::Unset,
            object: None,
            fields: None,
            errors: String::new(),
        }
    }

    /// Load a hex payload, resetting earlier results
    pub fn set_payload(&mut self, hex_data: &str) {
        self.stage = ValidationStage::Unset;
        self.object = None;
        self.fields = None;
        self.errors.clear();

        if hex_data.is_empty() {
            return;
        }
        match decode_payload(hex_data) {
            Ok(object) => {
                self.object = Some(object);
                self.stage = ValidationStage::JsonParsed;
            }
            Err(e) => {
                if !matches!(e, GovernanceError::InvalidHex(_)) {
                    self.stage = ValidationStage::HexDecoded;
                }
                self.push_error(&e.to_string());
            }
        }
    }

    /// Current stage
    pub fn stage(&self) -> ValidationStage {
        self.stage
    }

    /// Accumulated `;`-terminated messages
    pub fn error_messages(&self) -> &str {
        &self.errors
    }

    /// Run schema and field checks, stopping at the first failing step
    pub fn validate(&mut self) -> bool {
        let passed = self.run_checks();
        self.stage = ValidationStage::FieldChecked { passed };
        passed
    }

    /// `validate`, additionally requiring `end_epoch` to lie after `now`
    pub fn validate_with_expiration(&mut self, now: i64) -> bool {
        if !self.validate() {
            return false;
        }
        let expired = self.fields.as_ref().map_or(true, |f| f.end_epoch <= now);
        if expired {
            self.push_error("expired");
            self.stage = ValidationStage::FieldChecked { passed: false };
            return false;
        }
        true
    }

    fn run_checks(&mut self) -> bool {
        let Some(object) = &self.object else {
            self.errors.push_str("JSON parsing error;");
            return false;
        };
        let fields = match check_schema(object, self.limits) {
            Ok(fields) => fields,
            Err(detail) => {
                self.push_error(&detail);
                self.push_error("JSON schema error");
                return false;
            }
        };
        self.stage = ValidationStage::SchemaChecked;

        let outcome = self
            .check_name(&fields.name)
            .map_err(|d| (d, "Invalid name"))
            .and_then(|_| check_window(&fields).map_err(|d| (d, "Invalid start:end range")))
            .and_then(|_| {
                check_amount(fields.payment_amount).map_err(|d| (d, "Invalid payment amount"))
            })
            .and_then(|_| {
                self.check_address(&fields.payment_address)
                    .map_err(|d| (d, "Invalid payment address"))
            })
            .and_then(|_| self.check_url_field(&fields.url).map_err(|d| (d, "Invalid URL")));

        self.fields = Some(fields);
        match outcome {
            Ok(()) => true,
            Err((detail, summary)) => {
                self.push_error(&detail);
                self.push_error(summary);
                false
            }
        }
    }

    fn check_name(&self, name: &str) -> Result<(), String> {
        if name.len() > self.limits.max_name_len {
            return Err(format!(
                "name exceeds {} characters",
                self.limits.max_name_len
            ));
        }
        if strip_whitespace(name).is_empty() {
            return Err("name is empty".into());
        }
        let allowed = |b: u8| matches!(b.to_ascii_lowercase(), b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_');
        if !name.bytes().all(allowed) {
            return Err("name contains invalid characters".into());
        }
        Ok(())
    }

    fn check_address(&self, address: &str) -> Result<(), String> {
        match self.codec.decode(address) {
            None => Err("payment_address is invalid".into()),
            Some(dest) if dest.is_script() => Err("script addresses are not supported".into()),
            Some(_) => Ok(()),
        }
    }

    fn check_url_field(&self, url: &str) -> Result<(), String> {
        if strip_whitespace(url).chars().count() < self.limits.min_url_len {
            return Err("url too short".into());
        }
        if !check_url(url) {
            return Err("url invalid".into());
        }
        Ok(())
    }

    fn push_error(&mut self, message: &str) {
        self.errors.push_str(message);
        self.errors.push(';');
    }
}

fn check_schema(object: &JsonObject, limits: &ProposalLimits) -> Result<ProposalFields, String> {
    match object.get("type").map(Value::as_i64) {
        None => return Err("type field not found".into()),
        Some(Some(1)) => {}
        Some(_) => return Err("type is not a proposal".into()),
    }

    let payment_amount = number_field(object, "payment_amount")?;
    if !(limits.min_payment_amount..=limits.max_payment_amount).contains(&payment_amount) {
        return Err("payment_amount out of range".into());
    }

    Ok(ProposalFields {
        name: string_field(object, "name")?,
        url: string_field(object, "url")?,
        payment_address: string_field(object, "payment_address")?,
        payment_amount,
        start_epoch: epoch_field(object, "start_epoch")?,
        end_epoch: epoch_field(object, "end_epoch")?,
    })
}

fn string_field(object: &JsonObject, field: &str) -> Result<String, String> {
    match object.get(field) {
        None => Err(format!("{field} field not found")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("{field} is not a string")),
    }
}

fn number_field(object: &JsonObject, field: &str) -> Result<f64, String> {
    match object.get(field) {
        None => Err(format!("{field} field not found")),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| format!("{field} is not a number")),
    }
}

fn epoch_field(object: &JsonObject, field: &str) -> Result<i64, String> {
    match object.get(field) {
        None => Err(format!("{field} field not found")),
        Some(value) => match value.as_i64() {
            Some(epoch) if (0..=MAX_EPOCH).contains(&epoch) => Ok(epoch),
            Some(_) => Err(format!("{field} out of range")),
            None => Err(format!("{field} is not an integer")),
        },
    }
}

fn check_window(fields: &ProposalFields) -> Result<(), String> {
    if fields.end_epoch <= fields.start_epoch {
        return Err("end_epoch <= start_epoch".into());
    }
    Ok(())
}

fn check_amount(amount: f64) -> Result<(), String> {
    if amount <= 0.0 {
        return Err("payment_amount is negative".into());
    }
    Ok(())
}

/// Trim the whitespace set used by admission checks
pub fn strip_whitespace(text: &str) -> &str {
    text.trim_matches(|c| WHITESPACE.contains(c))
}

/// Tolerant URL check
///
/// Only an unbalanced IPv6 bracket in the netloc is rejected, matching the
/// URL parser used by proposal tooling.
pub fn check_url(url: &str) -> bool {
    let rest = match url.find(':') {
        Some(pos) => &url[pos + 1..],
        None => url,
    };
    if rest.len() > 2 && rest.starts_with("//") {
        let rest = &rest[2..];
        let netloc = match rest.find(['/', '?', '#']) {
            Some(end) => &rest[..end],
            None => rest,
        };
        if netloc.contains('[') != netloc.contains(']') {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentDestination;
    use serde_json::json;

    struct PrefixCodec;

    impl AddressCodec for PrefixCodec {
        fn decode(&self, address: &str) -> Option<PaymentDestination> {
            match address.chars().next() {
                Some('X') => Some(PaymentDestination::KeyHash([1u8; 20])),
                Some('7') => Some(PaymentDestination::ScriptHash([2u8; 20])),
                _ => None,
            }
        }
        fn encode(&self, _destination: &PaymentDestination) -> String {
            "X".into()
        }
    }

    fn minimal() -> serde_json::Value {
        json!({
            "type": 1, "name": "abc", "url": "http://x.io",
            "payment_address": "Xvalid", "payment_amount": 1.0,
            "start_epoch": 1000, "end_epoch": 2000
        })
    }

    fn run(value: serde_json::Value) -> (bool, String) {
        let limits = ProposalLimits::default();
        let mut validator = ProposalValidator::new(&PrefixCodec, &limits);
        validator.set_payload(&hex::encode(value.to_string()));
        let ok = validator.validate();
        (ok, validator.error_messages().to_string())
    }

    #[test]
    fn test_minimal_payload_accepted() {
        let (ok, errors) = run(minimal());
        assert!(ok, "{errors}");
        assert_eq!(errors, "");
    }

    #[test]
    fn test_wrapped_payload_accepted() {
        let (ok, _) = run(json!([["proposal", minimal()]]));
        assert!(ok);
    }

    #[test]
    fn test_missing_address_rejected() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("payment_address");
        let (ok, errors) = run(value);
        assert!(!ok);
        assert!(errors.contains("payment_address field not found;"));
    }

    #[test]
    fn test_long_name_rejected() {
        let mut value = minimal();
        value["name"] = json!("a".repeat(41));
        let (ok, errors) = run(value);
        assert!(!ok);
        assert_eq!(errors, "name exceeds 40 characters;Invalid name;");
    }

    #[test]
    fn test_name_character_set() {
        let mut value = minimal();
        value["name"] = json!("Dev-Fund_2");
        assert!(run(value.clone()).0);
        value["name"] = json!("dev fund");
        assert_eq!(
            run(value.clone()).1,
            "name contains invalid characters;Invalid name;"
        );
        value["name"] = json!("   ");
        assert_eq!(run(value).1, "name is empty;Invalid name;");
    }

    #[test]
    fn test_name_rejects_non_ascii_case_folding() {
        let mut value = minimal();
        // KELVIN SIGN lowercases to 'k' under Unicode rules
        value["name"] = json!("\u{212A}ey-fund");
        let (ok, errors) = run(value.clone());
        assert!(!ok);
        assert_eq!(errors, "name contains invalid characters;Invalid name;");

        // limit counts bytes
        value["name"] = json!("\u{e9}".repeat(21));
        let (ok, errors) = run(value);
        assert!(!ok);
        assert_eq!(errors, "name exceeds 40 characters;Invalid name;");
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut value = minimal();
        value["end_epoch"] = json!(1000);
        let (ok, errors) = run(value);
        assert!(!ok);
        assert!(errors.contains("end_epoch <= start_epoch;"));
    }

    #[test]
    fn test_amount_bounds() {
        let mut value = minimal();
        value["payment_amount"] = json!(6652.5);
        assert!(run(value.clone()).1.contains("payment_amount out of range;"));
        value["payment_amount"] = json!(0);
        assert!(!run(value).0);
    }

    #[test]
    fn test_script_address_rejected() {
        let mut value = minimal();
        value["payment_address"] = json!("7script");
        let (_, errors) = run(value);
        assert_eq!(
            errors,
            "script addresses are not supported;Invalid payment address;"
        );
    }

    #[test]
    fn test_url_checks() {
        let mut value = minimal();
        value["url"] = json!(" ab ");
        assert_eq!(run(value.clone()).1, "url too short;Invalid URL;");
        value["url"] = json!("http://[::1/path");
        assert_eq!(run(value).1, "url invalid;Invalid URL;");
    }

    #[test]
    fn test_check_url_grammar() {
        assert!(check_url("http://x.io"));
        assert!(check_url("http://[::1]:80/a"));
        assert!(check_url("no-scheme-at-all"));
        assert!(check_url("http://x.io/[path"));
        assert!(!check_url("http://]x.io"));
        assert!(!check_url("https://[::1?q"));
    }

    #[test]
    fn test_stage_transitions() {
        let limits = ProposalLimits::default();
        let mut validator = ProposalValidator::new(&PrefixCodec, &limits);
        assert_eq!(validator.stage(), ValidationStage::Unset);

        validator.set_payload("zz");
        assert_eq!(validator.stage(), ValidationStage::Unset);
        assert!(!validator.validate());
        assert!(validator.error_messages().ends_with("JSON parsing error;"));

        validator.set_payload(&hex::encode("{oops"));
        assert_eq!(validator.stage(), ValidationStage::HexDecoded);

        validator.set_payload(&hex::encode(minimal().to_string()));
        assert_eq!(validator.stage(), ValidationStage::JsonParsed);
        assert!(validator.validate());
        assert_eq!(
            validator.stage(),
            ValidationStage::FieldChecked { passed: true }
        );
    }

    #[test]
    fn test_expiration() {
        let limits = ProposalLimits::default();
        let mut validator = ProposalValidator::new(&PrefixCodec, &limits);
        validator.set_payload(&hex::encode(minimal().to_string()));
        assert!(validator.validate_with_expiration(1500));
        validator.set_payload(&hex::encode(minimal().to_string()));
        assert!(!validator.validate_with_expiration(2000));
        assert_eq!(validator.error_messages(), "expired;");
    }
}
