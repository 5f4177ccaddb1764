use crypto_box::aead::{Aead, AeadCore};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;

use crate::error::CryptoError;
use crate::keys::KeyBytes;

const SIGNATURE_LEN: usize = 64;
const NONCE_LEN: usize = 24;

/// A participant's full key material: one X25519 key for authenticated
/// encryption, one Ed25519 key for signing. Generated fresh at process
/// start and never persisted.
pub struct KeyPair {
    secret: SecretKey,
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::generate(&mut OsRng),
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> KeyBytes {
        KeyBytes::from(&self.public_key())
    }

    pub fn verifying_key_bytes(&self) -> KeyBytes {
        KeyBytes::from(&self.verifying_key())
    }

    /// Encrypt `plaintext` for `their_public` using this participant's
    /// secret key. The nonce generated by the box is prepended to the
    /// returned ciphertext so the receiver can recover it.
    pub fn encrypt(&self, plaintext: &[u8], their_public: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        let b = SalsaBox::new(their_public, &self.secret);
        let nonce = SalsaBox::generate_nonce(&mut OsRng);
        let ciphertext = b
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a blob produced by [`KeyPair::encrypt`], where `their_public`
    /// is the sender's X25519 public key.
    pub fn decrypt(&self, blob: &[u8], their_public: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < NONCE_LEN {
            return Err(CryptoError::CiphertextTooShort);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = crypto_box::Nonce::clone_from_slice(nonce_bytes);
        let b = SalsaBox::new(their_public, &self.secret);
        b.decrypt(&nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Sign `msg`, returning `signature (64 bytes) || msg`, mirroring
    /// PyNaCl's `SigningKey.sign`, which returns the signature prepended to
    /// the signed message.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(msg);
        let mut out = Vec::with_capacity(SIGNATURE_LEN + msg.len());
        out.extend_from_slice(&signature.to_bytes());
        out.extend_from_slice(msg);
        out
    }
}

/// Verify a blob produced by [`KeyPair::sign`] against `verify_key`,
/// returning the original message on success.
pub fn verify(signed: &[u8], verify_key: &VerifyingKey) -> Result<Vec<u8>, CryptoError> {
    if signed.len() < SIGNATURE_LEN {
        return Err(CryptoError::SignatureTooShort);
    }
    let (sig_bytes, msg) = signed.split_at(SIGNATURE_LEN);
    let sig_array: [u8; SIGNATURE_LEN] = sig_bytes
        .try_into()
        .expect("split_at(SIGNATURE_LEN) guarantees exact length");
    let signature = Signature::from_bytes(&sig_array);
    verify_key
        .verify(msg, &signature)
        .map_err(|_| CryptoError::VerificationFailed)?;
    Ok(msg.to_vec())
}

/// Encrypt then sign: the ciphertext (nonce included) is what gets
/// signed, never the plaintext.
pub fn encrypt_then_sign(
    keypair: &KeyPair,
    their_public: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = keypair.encrypt(plaintext, their_public)?;
    Ok(keypair.sign(&ciphertext))
}

/// Verify then decrypt, the receive-side mirror of
/// [`encrypt_then_sign`]: the signature is checked first and only a
/// verified ciphertext is ever handed to the box for decryption.
pub fn verify_then_decrypt(
    keypair: &KeyPair,
    their_verify_key: &VerifyingKey,
    their_public: &PublicKey,
    signed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = verify(signed, their_verify_key)?;
    keypair.decrypt(&ciphertext, their_public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trips() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let msg = b"transfer 10 to ident 2";

        let ciphertext = alice.encrypt(msg, &bob.public_key()).unwrap();
        let plaintext = bob.decrypt(&ciphertext, &alice.public_key()).unwrap();
        assert_eq!(plaintext, msg);
    }

    #[test]
    fn decrypt_fails_with_wrong_sender_key() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mallory = KeyPair::generate();

        let ciphertext = alice.encrypt(b"hello", &bob.public_key()).unwrap();
        let result = bob.decrypt(&ciphertext, &mallory.public_key());
        assert!(result.is_err());
    }

    #[test]
    fn sign_verify_round_trips() {
        let alice = KeyPair::generate();
        let msg = b"PEER_VERIFY";
        let signed = alice.sign(msg);
        let recovered = verify(&signed, &alice.verifying_key()).unwrap();
        assert_eq!(recovered, msg);
    }

    #[test]
    fn verify_rejects_tampered_blob() {
        let alice = KeyPair::generate();
        let mut signed = alice.sign(b"PEER_VERIFY");
        let last = signed.len() - 1;
        signed[last] ^= 0xFF;
        assert!(verify(&signed, &alice.verifying_key()).is_err());
    }

    #[test]
    fn encrypt_then_sign_round_trips_through_verify_then_decrypt() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let msg = b"{\"kind\":\"PEER_VERIFY\"}";

        let blob = encrypt_then_sign(&alice, &bob.public_key(), msg).unwrap();
        let recovered =
            verify_then_decrypt(&bob, &alice.verifying_key(), &alice.public_key(), &blob).unwrap();
        assert_eq!(recovered, msg);
    }

    #[test]
    fn verify_then_decrypt_rejects_impostor_signature() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mallory = KeyPair::generate();

        let blob = encrypt_then_sign(&mallory, &bob.public_key(), b"PEER_VERIFY").unwrap();
        let result =
            verify_then_decrypt(&bob, &alice.verifying_key(), &mallory.public_key(), &blob);
        assert!(result.is_err());
    }
}
