use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] ledger_wire::WireError),

    #[error("crypto error: {0}")]
    Crypto(#[from] ledger_crypto::CryptoError),

    #[error("admission aborted before registry commit: {0}")]
    AdmissionAborted(String),
}
