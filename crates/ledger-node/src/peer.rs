use std::sync::Arc;

use ledger_peer::PeerDescriptor;
use ledger_wire::{recv_encrypted, recv_plain, send_encrypted, send_plain, Message};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::error::NodeError;
use crate::mining;
use crate::state::SharedState;

/// Dial `descriptor` and run the initiator side of the peer handshake
/// On success, registers the connection and spawns its reader. On
/// any failure, records the peer as rejected and removes it from the
/// directory — the rest of admission continues undisturbed.
pub async fn dial_peer(state: &Arc<SharedState>, descriptor: PeerDescriptor) -> Result<(), NodeError> {
    let ident = descriptor.ident;
    match dial_peer_inner(state, &descriptor).await {
        Ok(()) => Ok(()),
        Err(err) => {
            state.reject_peer(ident).await;
            Err(err)
        }
    }
}

async fn dial_peer_inner(state: &Arc<SharedState>, descriptor: &PeerDescriptor) -> Result<(), NodeError> {
    let stream = TcpStream::connect((descriptor.host.as_str(), descriptor.port)).await?;
    let (mut read_half, mut write_half) = stream.into_split();

    let their_public: ledger_crypto::PublicKey = (&descriptor.public_key).try_into()?;
    let their_verify: ledger_crypto::VerifyingKey = (&descriptor.verify_key).try_into()?;

    send_plain(&mut write_half, &Message::PeerIdent { ident: state.ident }).await?;

    recv_encrypted(&mut read_half, &state.keypair, &their_verify, &their_public)
        .await?
        .expect_peer_verify()?;

    send_encrypted(&mut write_half, &state.keypair, &their_public, &Message::PeerVerify {}).await?;

    recv_encrypted(&mut read_half, &state.keypair, &their_verify, &their_public)
        .await?
        .expect_peer_accept()?;

    info!(peer = descriptor.ident, "peer handshake complete (dialer)");
    state.register_peer_socket(descriptor.ident, write_half).await;
    tokio::spawn(reader(Arc::clone(state), descriptor.ident, read_half, their_verify, their_public));
    Ok(())
}

/// Accept inbound peer dials for as long as the node is running.
pub async fn accept_loop(state: Arc<SharedState>, listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(err) = accept_peer(state, stream).await {
                        warn!(%addr, error = %err, "peer handshake failed (acceptor)");
                    }
                });
            }
            Err(err) => {
                warn!(error = %err, "failed to accept peer connection");
                break;
            }
        }
    }
}

/// Responder side of the peer handshake.
async fn accept_peer(state: Arc<SharedState>, stream: TcpStream) -> Result<(), NodeError> {
    let (mut read_half, mut write_half) = stream.into_split();

    let claimed = recv_plain(&mut read_half).await?.expect_peer_ident()?;
    let descriptor = {
        let inner = state.lock().await;
        inner.peers.get(claimed).cloned()
    }
    .ok_or(NodeError::UnknownPeer(claimed))?;

    let their_public: ledger_crypto::PublicKey = (&descriptor.public_key).try_into()?;
    let their_verify: ledger_crypto::VerifyingKey = (&descriptor.verify_key).try_into()?;

    send_encrypted(&mut write_half, &state.keypair, &their_public, &Message::PeerVerify {}).await?;

    let verified: Result<(), ledger_wire::WireError> = match recv_encrypted(
        &mut read_half,
        &state.keypair,
        &their_verify,
        &their_public,
    )
    .await
    {
        Ok(m) => m.expect_peer_verify(),
        Err(err) => Err(err),
    };

    if let Err(err) = verified {
        state.reject_peer(claimed).await;
        return Err(err.into());
    }

    send_encrypted(&mut write_half, &state.keypair, &their_public, &Message::PeerAccept {}).await?;

    info!(peer = claimed, "peer handshake complete (acceptor)");
    state.register_peer_socket(claimed, write_half).await;
    tokio::spawn(reader(state, claimed, read_half, their_verify, their_public));
    Ok(())
}

/// Reads encrypted frames from one peer until the link breaks or the peer
/// says goodbye. Dispatches transactions and blocks into the mining
/// machinery; any other kind closes this link only.
async fn reader(
    state: Arc<SharedState>,
    ident: u64,
    mut read_half: OwnedReadHalf,
    verify_key: ledger_crypto::VerifyingKey,
    public_key: ledger_crypto::PublicKey,
) {
    loop {
        let message = match recv_encrypted(&mut read_half, &state.keypair, &verify_key, &public_key).await {
            Ok(m) => m,
            Err(err) => {
                warn!(peer = ident, error = %err, "peer link broken");
                break;
            }
        };

        match message {
            Message::NodeDisconnect {} => {
                info!(peer = ident, "peer disconnected");
                break;
            }
            Message::PeerTransaction { transaction } => {
                mining::inbound_transaction(Arc::clone(&state), transaction).await;
            }
            Message::PeerBlock { block } => {
                state.absorb_block(block).await;
                info!(peer = ident, "absorbed PEER_BLOCK");
            }
            other => {
                warn!(peer = ident, kind = other.kind(), "unexpected message kind from peer");
                break;
            }
        }
    }

    state.remove_peer(ident).await;
}
