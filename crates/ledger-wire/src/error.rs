use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("link closed mid-frame")]
    BrokenLink,

    #[error("link closed cleanly")]
    LinkClosed,

    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] ledger_crypto::CryptoError),

    #[error("unexpected message kind: expected {expected}, got {got}")]
    UnexpectedKind { expected: &'static str, got: &'static str },
}
