use std::sync::Arc;

use ledger_chain::{Block, Transaction};
use ledger_wire::{send_encrypted, Message};
use tracing::warn;

use crate::state::SharedState;

/// Iterate the peer directory; for each peer with a live socket, send `msg`.
/// Peers known in the directory but with no socket (or whose send fails)
/// are removed once the iteration completes, never while it's in progress.
async fn broadcast(state: &Arc<SharedState>, msg: Message) {
    let targets = state.peers_snapshot().await;
    let mut to_remove = Vec::new();

    for target in targets {
        let public_key: ledger_crypto::PublicKey = match (&target.public_key).try_into() {
            Ok(k) => k,
            Err(_) => {
                to_remove.push(target.ident);
                continue;
            }
        };

        let mut inner = state.lock().await;
        let socket = match inner.peer_sockets.get_mut(&target.ident) {
            Some(socket) => socket,
            None => {
                drop(inner);
                to_remove.push(target.ident);
                continue;
            }
        };
        let result = send_encrypted(socket, &state.keypair, &public_key, &msg).await;
        drop(inner);

        if let Err(err) = result {
            warn!(peer = target.ident, error = %err, "broadcast send failed");
            to_remove.push(target.ident);
        }
    }

    for ident in to_remove {
        state.remove_peer(ident).await;
    }
}

pub async fn broadcast_transaction(state: &Arc<SharedState>, tx: &Transaction) {
    broadcast(state, Message::PeerTransaction { transaction: tx.clone() }).await;
}

pub async fn broadcast_block(state: &Arc<SharedState>, block: &Block) {
    broadcast(state, Message::PeerBlock { block: block.clone() }).await;
}
