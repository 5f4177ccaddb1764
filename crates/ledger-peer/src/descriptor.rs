use ledger_crypto::KeyBytes;
use serde::{Deserialize, Serialize};

/// Everything a node needs to dial and authenticate a peer. Created once by
/// the tracker at admission time and distributed verbatim afterwards;
/// immutable for the lifetime of the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    pub ident: u64,
    pub host: String,
    pub port: u16,
    pub public_key: KeyBytes,
    pub verify_key: KeyBytes,
}

impl PeerDescriptor {
    pub fn new(ident: u64, host: impl Into<String>, port: u16, public_key: KeyBytes, verify_key: KeyBytes) -> Self {
        Self { ident, host: host.into(), port, public_key, verify_key }
    }
}
