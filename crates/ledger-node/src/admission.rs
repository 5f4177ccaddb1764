use std::sync::Arc;

use ledger_chain::Blockchain;
use ledger_crypto::KeyPair;
use ledger_peer::PeerTable;
use ledger_wire::{recv_encrypted, recv_plain, send_encrypted, send_plain, Message};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::peer;
use crate::state::SharedState;

/// Dial the tracker and run the client side of admission. On success,
/// spawns the tracker reader and the peer-accept loop and returns the fully
/// constructed, already-running node.
pub async fn admit(config: &NodeConfig) -> Result<Arc<SharedState>, NodeError> {
    let stream = TcpStream::connect((config.tracker_host.as_str(), config.tracker_port))
        .await
        .map_err(|_| NodeError::TrackerRefused)?;
    let (mut read_half, mut write_half) = stream.into_split();

    let keypair = KeyPair::generate();

    // Step 1: NODE_KEYS, plaintext.
    send_plain(
        &mut write_half,
        &Message::NodeKeys { public_key: keypair.public_key_bytes(), verify_key: keypair.verifying_key_bytes() },
    )
    .await?;
    debug!("sent NODE_KEYS");

    // Step 2: TRACKER_IDENT, plaintext.
    let (ident, tracker_public, tracker_verify) = recv_plain(&mut read_half).await?.expect_tracker_ident()?;
    let tracker_public_key: ledger_crypto::PublicKey = (&tracker_public).try_into()?;
    let tracker_verify_key: ledger_crypto::VerifyingKey = (&tracker_verify).try_into()?;
    debug!(ident, "received TRACKER_IDENT");

    // Step 3: NODE_IDENT, now encrypted.
    send_encrypted(&mut write_half, &keypair, &tracker_public_key, &Message::NodeIdent {}).await?;

    // Step 4: the chain snapshot.
    let chain: Blockchain = recv_encrypted(&mut read_half, &keypair, &tracker_verify_key, &tracker_public_key)
        .await?
        .expect_tracker_chain()?;
    info!(ident, chain_len = chain.len(), "received TRACKER_CHAIN");
    if let Err(err) = chain.is_linked() {
        warn!(ident, error = %err, "tracker's chain snapshot failed link verification");
    }

    // Step 5: our listen port.
    send_encrypted(
        &mut write_half,
        &keypair,
        &tracker_public_key,
        &Message::NodePort { port: config.listen_port },
    )
    .await?;

    // Step 6: go-ahead, bind, ack.
    recv_encrypted(&mut read_half, &keypair, &tracker_verify_key, &tracker_public_key)
        .await?
        .expect_node_listen()?;
    let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
    send_encrypted(&mut write_half, &keypair, &tracker_public_key, &Message::NodeListen {}).await?;
    debug!(port = config.listen_port, "listener bound");

    // Step 7-8: peer directory.
    let peer_list = recv_encrypted(&mut read_half, &keypair, &tracker_verify_key, &tracker_public_key)
        .await?
        .expect_tracker_peers()?;
    send_encrypted(&mut write_half, &keypair, &tracker_public_key, &Message::NodePeers {}).await?;

    let mut peers = PeerTable::new();
    for descriptor in &peer_list {
        peers.insert(descriptor.clone());
    }

    // Step 9: final admission.
    recv_encrypted(&mut read_half, &keypair, &tracker_verify_key, &tracker_public_key)
        .await?
        .expect_tracker_accept()?;
    info!(ident, peer_count = peer_list.len(), "admitted");

    let state = SharedState::new(
        ident,
        keypair,
        tracker_public_key,
        tracker_verify_key,
        write_half,
        chain,
        peers,
        config.listen_port,
        config.difficulty,
    );

    // Step 10: for each already-admitted peer, dial in and run the
    // handshake. Each dial runs independently so one unreachable peer can't
    // block the others.
    for descriptor in peer_list {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = peer::dial_peer(&state, descriptor.clone()).await {
                tracing::warn!(peer = descriptor.ident, error = %err, "peer dial failed during admission");
            }
        });
    }

    // Spawn the tracker reader and the peer accept loop.
    let tracker_state = Arc::clone(&state);
    tokio::spawn(tracker_reader(tracker_state, read_half));

    let accept_state = Arc::clone(&state);
    tokio::spawn(peer::accept_loop(accept_state, listener));

    Ok(state)
}

/// Reads frames from the tracker until the link breaks. The only message
/// the tracker ever sends unprompted is `TRACKER_NEW_PEER`; anything else,
/// or a framing/crypto failure, ends the node's relationship with the
/// tracker (the node itself is unaffected otherwise; only that one link closes).
async fn tracker_reader(state: Arc<SharedState>, mut read_half: tokio::net::tcp::OwnedReadHalf) {
    loop {
        let message =
            match recv_encrypted(&mut read_half, &state.keypair, &state.tracker_verify, &state.tracker_public).await {
                Ok(m) => m,
                Err(err) => {
                    tracing::warn!(error = %err, "tracker link broken");
                    break;
                }
            };

        match message {
            Message::TrackerNewPeer { peer } => {
                info!(peer = peer.ident, "new peer introduced by tracker");
                state.insert_peer(peer).await;
            }
            Message::NodeDisconnect {} => {
                info!("tracker said goodbye");
                break;
            }
            other => {
                tracing::warn!(kind = other.kind(), "unexpected message kind from tracker");
                break;
            }
        }
    }

    state.mark_disconnected();
}

/// Send a `PEER_BLOCK` to the tracker so it can mirror the chain. Purely
/// informational: failures are swallowed, since the tracker may already
/// have closed its end during a shutdown race.
pub async fn inform_tracker_of_block(state: &Arc<SharedState>, block: &ledger_chain::Block) {
    let mut guard = state.tracker_socket.lock().await;
    if let Some(socket) = guard.as_mut() {
        let _ = send_encrypted(
            socket,
            &state.keypair,
            &state.tracker_public,
            &Message::PeerBlock { block: block.clone() },
        )
        .await;
    }
}

/// Send `NODE_DISCONNECT` to the tracker, swallowing send failures.
pub async fn farewell_tracker(state: &Arc<SharedState>) {
    let mut guard = state.tracker_socket.lock().await;
    if let Some(socket) = guard.as_mut() {
        let _ = send_encrypted(socket, &state.keypair, &state.tracker_public, &Message::NodeDisconnect {}).await;
    }
    *guard = None;
}
