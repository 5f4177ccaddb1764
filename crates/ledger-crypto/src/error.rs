use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext too short to contain a nonce")]
    CiphertextTooShort,

    #[error("box decryption failed")]
    DecryptionFailed,

    #[error("signed blob too short to contain a signature")]
    SignatureTooShort,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("malformed key bytes: expected {expected} bytes, got {got}")]
    MalformedKey { expected: usize, got: usize },

    #[error("invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),
}
