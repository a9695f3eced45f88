//! Base58Check address codec

use crate::config::AddressConfig;
use crate::domain::PaymentDestination;
use crate::ports::AddressCodec;

/// Decoded payload length: version byte plus a 20-byte hash
const PAYLOAD_LEN: usize = 21;

/// Addresses as version byte, 20-byte hash and 4-byte checksum in Base58
#[derive(Clone, Debug, Default)]
pub struct Base58CheckAddressCodec {
    config: AddressConfig,
}

impl Base58CheckAddressCodec {
    /// Create a codec for the given version bytes
    pub fn new(config: AddressConfig) -> Self {
        Self { config }
    }
}

impl AddressCodec for Base58CheckAddressCodec {
    fn decode(&self, address: &str) -> Option<PaymentDestination> {
        let bytes = bs58::decode(address).with_check(None).into_vec().ok()?;
        if bytes.len() != PAYLOAD_LEN {
            return None;
        }
        let hash: [u8; 20] = bytes[1..].try_into().ok()?;
        match bytes[0] {
            v if v == self.config.pubkey_prefix => Some(PaymentDestination::KeyHash(hash)),
            v if v == self.config.script_prefix => Some(PaymentDestination::ScriptHash(hash)),
            _ => None,
        }
    }

    fn encode(&self, destination: &PaymentDestination) -> String {
        let (version, hash) = match destination {
            PaymentDestination::KeyHash(hash) => (self.config.pubkey_prefix, hash),
            PaymentDestination::ScriptHash(hash) => (self.config.script_prefix, hash),
        };
        let mut bytes = Vec::with_capacity(PAYLOAD_LEN);
        bytes.push(version);
        bytes.extend_from_slice(hash);
        bs58::encode(bytes).with_check().into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Script;

    const KEY_ADDRESS: &str = "XcF5mKwWsiv3k394GBQNpYAuk3CVJ48Xnp";
    const SCRIPT_ADDRESS: &str = "7VX8ctLrBuowG8KLCJWQh2KptUMgkakeuY";

    #[test]
    fn test_decode_known_addresses() {
        let codec = Base58CheckAddressCodec::default();
        assert_eq!(
            codec.decode(KEY_ADDRESS),
            Some(PaymentDestination::KeyHash([0x11; 20]))
        );
        assert_eq!(
            codec.decode(SCRIPT_ADDRESS),
            Some(PaymentDestination::ScriptHash([0x22; 20]))
        );
        assert!(codec.is_script_address(SCRIPT_ADDRESS));
        assert!(!codec.is_script_address(KEY_ADDRESS));
    }

    #[test]
    fn test_encode_matches_known_addresses() {
        let codec = Base58CheckAddressCodec::default();
        assert_eq!(
            codec.encode(&PaymentDestination::KeyHash([0x11; 20])),
            KEY_ADDRESS
        );
        assert_eq!(
            codec.extract_address(&Script::pay_to_script_hash(&[0x22; 20])),
            Some(SCRIPT_ADDRESS.to_string())
        );
    }

    #[test]
    fn test_rejects_bad_checksum_and_prefix() {
        let codec = Base58CheckAddressCodec::default();
        let mut corrupted = KEY_ADDRESS.to_string();
        corrupted.replace_range(5..6, "z");
        assert_eq!(codec.decode(&corrupted), None);
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("0OIl"), None);

        let other_network = Base58CheckAddressCodec::new(AddressConfig {
            pubkey_prefix: 140,
            script_prefix: 19,
        });
        assert_eq!(other_network.decode(KEY_ADDRESS), None);
    }
}
