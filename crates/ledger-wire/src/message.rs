use ledger_chain::{Block, Transaction};
use ledger_crypto::KeyBytes;
use ledger_peer::PeerDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// One of the sixteen message kinds the tracker/node/peer protocol sends.
/// `kind()` gives the `&'static str` used both in the JSON `"kind"` tag and
/// in error messages so a rejected frame can name what it expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    #[serde(rename = "NODE_KEYS")]
    NodeKeys { public_key: KeyBytes, verify_key: KeyBytes },

    #[serde(rename = "TRACKER_IDENT")]
    TrackerIdent { ident: u64, public_key: KeyBytes, verify_key: KeyBytes },

    #[serde(rename = "NODE_IDENT")]
    NodeIdent {},

    #[serde(rename = "TRACKER_CHAIN")]
    TrackerChain { blockchain: ledger_chain::Blockchain },

    #[serde(rename = "NODE_PORT")]
    NodePort { port: u16 },

    #[serde(rename = "NODE_LISTEN")]
    NodeListen {},

    #[serde(rename = "TRACKER_PEERS")]
    TrackerPeers { peers: Vec<PeerDescriptor> },

    #[serde(rename = "NODE_PEERS")]
    NodePeers {},

    #[serde(rename = "TRACKER_ACCEPT")]
    TrackerAccept {},

    #[serde(rename = "TRACKER_NEW_PEER")]
    TrackerNewPeer { peer: PeerDescriptor },

    #[serde(rename = "PEER_IDENT")]
    PeerIdent { ident: u64 },

    #[serde(rename = "PEER_VERIFY")]
    PeerVerify {},

    #[serde(rename = "PEER_ACCEPT")]
    PeerAccept {},

    #[serde(rename = "NODE_DISCONNECT")]
    NodeDisconnect {},

    #[serde(rename = "PEER_TRANSACTION")]
    PeerTransaction { transaction: Transaction },

    #[serde(rename = "PEER_BLOCK")]
    PeerBlock { block: Block },
}

impl Message {
    /// The string used on the wire and in diagnostics; matches the variant
    /// name's `#[serde(rename)]` exactly.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::NodeKeys { .. } => "NODE_KEYS",
            Message::TrackerIdent { .. } => "TRACKER_IDENT",
            Message::NodeIdent {} => "NODE_IDENT",
            Message::TrackerChain { .. } => "TRACKER_CHAIN",
            Message::NodePort { .. } => "NODE_PORT",
            Message::NodeListen {} => "NODE_LISTEN",
            Message::TrackerPeers { .. } => "TRACKER_PEERS",
            Message::NodePeers {} => "NODE_PEERS",
            Message::TrackerAccept {} => "TRACKER_ACCEPT",
            Message::TrackerNewPeer { .. } => "TRACKER_NEW_PEER",
            Message::PeerIdent { .. } => "PEER_IDENT",
            Message::PeerVerify {} => "PEER_VERIFY",
            Message::PeerAccept {} => "PEER_ACCEPT",
            Message::NodeDisconnect {} => "NODE_DISCONNECT",
            Message::PeerTransaction { .. } => "PEER_TRANSACTION",
            Message::PeerBlock { .. } => "PEER_BLOCK",
        }
    }
}

impl Message {
    pub fn expect_node_keys(self) -> Result<(KeyBytes, KeyBytes), WireError> {
        match self {
            Message::NodeKeys { public_key, verify_key } => Ok((public_key, verify_key)),
            other => Err(WireError::UnexpectedKind { expected: "NODE_KEYS", got: other.kind() }),
        }
    }

    pub fn expect_tracker_ident(self) -> Result<(u64, KeyBytes, KeyBytes), WireError> {
        match self {
            Message::TrackerIdent { ident, public_key, verify_key } => Ok((ident, public_key, verify_key)),
            other => Err(WireError::UnexpectedKind { expected: "TRACKER_IDENT", got: other.kind() }),
        }
    }

    pub fn expect_tracker_chain(self) -> Result<ledger_chain::Blockchain, WireError> {
        match self {
            Message::TrackerChain { blockchain } => Ok(blockchain),
            other => Err(WireError::UnexpectedKind { expected: "TRACKER_CHAIN", got: other.kind() }),
        }
    }

    pub fn expect_node_port(self) -> Result<u16, WireError> {
        match self {
            Message::NodePort { port } => Ok(port),
            other => Err(WireError::UnexpectedKind { expected: "NODE_PORT", got: other.kind() }),
        }
    }

    pub fn expect_tracker_peers(self) -> Result<Vec<PeerDescriptor>, WireError> {
        match self {
            Message::TrackerPeers { peers } => Ok(peers),
            other => Err(WireError::UnexpectedKind { expected: "TRACKER_PEERS", got: other.kind() }),
        }
    }

    pub fn expect_tracker_new_peer(self) -> Result<PeerDescriptor, WireError> {
        match self {
            Message::TrackerNewPeer { peer } => Ok(peer),
            other => Err(WireError::UnexpectedKind { expected: "TRACKER_NEW_PEER", got: other.kind() }),
        }
    }

    pub fn expect_peer_ident(self) -> Result<u64, WireError> {
        match self {
            Message::PeerIdent { ident } => Ok(ident),
            other => Err(WireError::UnexpectedKind { expected: "PEER_IDENT", got: other.kind() }),
        }
    }

    pub fn expect_peer_transaction(self) -> Result<Transaction, WireError> {
        match self {
            Message::PeerTransaction { transaction } => Ok(transaction),
            other => Err(WireError::UnexpectedKind { expected: "PEER_TRANSACTION", got: other.kind() }),
        }
    }

    pub fn expect_peer_block(self) -> Result<Block, WireError> {
        match self {
            Message::PeerBlock { block } => Ok(block),
            other => Err(WireError::UnexpectedKind { expected: "PEER_BLOCK", got: other.kind() }),
        }
    }

    pub fn expect_node_ident(self) -> Result<(), WireError> {
        match self {
            Message::NodeIdent {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "NODE_IDENT", got: other.kind() }),
        }
    }

    pub fn expect_node_listen(self) -> Result<(), WireError> {
        match self {
            Message::NodeListen {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "NODE_LISTEN", got: other.kind() }),
        }
    }

    pub fn expect_node_peers(self) -> Result<(), WireError> {
        match self {
            Message::NodePeers {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "NODE_PEERS", got: other.kind() }),
        }
    }

    pub fn expect_tracker_accept(self) -> Result<(), WireError> {
        match self {
            Message::TrackerAccept {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "TRACKER_ACCEPT", got: other.kind() }),
        }
    }

    pub fn expect_peer_verify(self) -> Result<(), WireError> {
        match self {
            Message::PeerVerify {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "PEER_VERIFY", got: other.kind() }),
        }
    }

    pub fn expect_peer_accept(self) -> Result<(), WireError> {
        match self {
            Message::PeerAccept {} => Ok(()),
            other => Err(WireError::UnexpectedKind { expected: "PEER_ACCEPT", got: other.kind() }),
        }
    }
}
