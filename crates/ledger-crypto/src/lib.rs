pub mod error;
pub mod keypair;
pub mod keys;

pub use error::CryptoError;
pub use keypair::{encrypt_then_sign, verify, verify_then_decrypt, KeyPair};
pub use keys::KeyBytes;

pub use crypto_box::PublicKey;
pub use ed25519_dalek::VerifyingKey;
