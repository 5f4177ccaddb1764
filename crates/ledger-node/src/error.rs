use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] ledger_wire::WireError),

    #[error("crypto error: {0}")]
    Crypto(#[from] ledger_crypto::CryptoError),

    #[error("tracker refused the connection")]
    TrackerRefused,

    #[error("peer {0} is not in the directory")]
    UnknownPeer(u64),

    #[error("peer {0} rejected the handshake")]
    PeerRejected(u64),
}
