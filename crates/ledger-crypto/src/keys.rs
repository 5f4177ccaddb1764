use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;

/// A raw 32-byte public key, (de)serialised as base64 on the wire.
///
/// `PeerDescriptor` and every handshake message carry keys through this
/// type rather than the underlying `crypto_box`/`ed25519_dalek` key types so
/// that JSON payloads match the wire format in full regardless of which
/// crate's representation changes underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBytes(pub [u8; 32]);

impl KeyBytes {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for KeyBytes {
    fn from(bytes: [u8; 32]) -> Self {
        KeyBytes(bytes)
    }
}

impl From<&crypto_box::PublicKey> for KeyBytes {
    fn from(pk: &crypto_box::PublicKey) -> Self {
        KeyBytes(*pk.as_bytes())
    }
}

impl From<&ed25519_dalek::VerifyingKey> for KeyBytes {
    fn from(vk: &ed25519_dalek::VerifyingKey) -> Self {
        KeyBytes(vk.to_bytes())
    }
}

impl TryFrom<&KeyBytes> for crypto_box::PublicKey {
    type Error = CryptoError;

    fn try_from(kb: &KeyBytes) -> Result<Self, Self::Error> {
        Ok(crypto_box::PublicKey::from(kb.0))
    }
}

impl TryFrom<&KeyBytes> for ed25519_dalek::VerifyingKey {
    type Error = CryptoError;

    fn try_from(kb: &KeyBytes) -> Result<Self, Self::Error> {
        ed25519_dalek::VerifyingKey::from_bytes(&kb.0)
            .map_err(|_| CryptoError::MalformedKey { expected: 32, got: kb.0.len() })
    }
}

impl Serialize for KeyBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for KeyBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(KeyBytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let kb = KeyBytes([7u8; 32]);
        let json = serde_json::to_string(&kb).unwrap();
        let back: KeyBytes = serde_json::from_str(&json).unwrap();
        assert_eq!(kb, back);
    }

    #[test]
    fn rejects_wrong_length() {
        let json = "\"AAAA\"";
        let result: Result<KeyBytes, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
