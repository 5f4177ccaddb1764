use std::sync::Arc;

use ledger_wire::{send_encrypted, Message};
use tracing::info;

use crate::admission::farewell_tracker;
use crate::state::SharedState;

/// Graceful disconnect: say goodbye to the tracker and to every
/// peer, swallowing send failures, then drop every socket and clear the
/// directories. Idempotent — calling it twice is a harmless no-op the
/// second time because there is nothing left to say goodbye to.
pub async fn disconnect(state: &Arc<SharedState>) {
    farewell_tracker(state).await;

    let idents = {
        let inner = state.lock().await;
        inner.peer_sockets.keys().copied().collect::<Vec<_>>()
    };

    for ident in idents {
        let descriptor = {
            let inner = state.lock().await;
            inner.peers.get(ident).cloned()
        };
        let Some(descriptor) = descriptor else { continue };
        let public_key: ledger_crypto::PublicKey = match (&descriptor.public_key).try_into() {
            Ok(k) => k,
            Err(_) => continue,
        };

        let mut inner = state.lock().await;
        if let Some(socket) = inner.peer_sockets.get_mut(&ident) {
            let _ = send_encrypted(socket, &state.keypair, &public_key, &Message::NodeDisconnect {}).await;
        }
    }

    let mut inner = state.lock().await;
    inner.peer_sockets.clear();
    inner.peers = ledger_peer::PeerTable::new();
    drop(inner);

    state.mark_disconnected();
    info!(ident = state.ident, "disconnected");
}
