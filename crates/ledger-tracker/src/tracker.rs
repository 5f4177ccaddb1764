use std::sync::Arc;

use ledger_chain::Blockchain;
use ledger_crypto::{KeyBytes, KeyPair};
use ledger_peer::PeerDescriptor;
use ledger_wire::{recv_encrypted, recv_plain, send_encrypted, send_plain, Message};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::error::TrackerError;
use crate::registry::NodeRegistry;

/// The per-connection admission state. Logged at `debug` as each connection
/// moves through it; the
/// control flow itself is just a sequence of blocking reads, not a table
/// driven by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Greeting,
    Identified,
    Snapshotted,
    PortKnown,
    Listening,
    Peered,
    Accepted,
    Monitoring,
}

/// Listens for nodes, admits them, hands out identities and a chain
/// snapshot, introduces them to every other admitted node, and then
/// monitors each one for disconnects and mined blocks.
///
/// `chain` and `registry` are each held behind their own `tokio::sync::Mutex`
/// so that admitting one node never blocks a concurrent monitor loop from
/// reading the chain, and vice versa.
pub struct Tracker {
    keypair: KeyPair,
    chain: Mutex<Blockchain>,
    registry: Mutex<NodeRegistry>,
    shutdown: Notify,
}

impl Tracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            keypair: KeyPair::generate(),
            chain: Mutex::new(Blockchain::new()),
            registry: Mutex::new(NodeRegistry::new()),
            shutdown: Notify::new(),
        })
    }

    pub fn public_key(&self) -> ledger_crypto::PublicKey {
        self.keypair.public_key()
    }

    pub fn verifying_key(&self) -> ledger_crypto::VerifyingKey {
        self.keypair.verifying_key()
    }

    /// A snapshot of the tracker's own chain, as mirrored by `PEER_BLOCK`s
    /// nodes forward to it. Informational only; the
    /// tracker never validates or rebroadcasts it.
    pub async fn chain_snapshot(&self) -> Blockchain {
        self.chain.lock().await.clone()
    }

    pub async fn peers_snapshot(&self) -> Vec<PeerDescriptor> {
        self.registry.lock().await.snapshot_peers()
    }

    pub async fn node_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Accept connections until [`Tracker::shutdown`] is called. Each
    /// accepted connection is admitted and monitored on its own task so a
    /// slow or hostile peer can never block admission of the others.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let this = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(err) = this.handle_connection(stream, addr.ip().to_string()).await {
                                    warn!(%addr, error = %err, "connection closed before admission completed");
                                }
                            });
                        }
                        Err(err) => warn!(error = %err, "failed to accept connection"),
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("listener shutting down");
                    break;
                }
            }
        }
    }

    /// Close the listener, close every admitted node's socket, and clear the
    /// registry. Idempotent: calling it again after it already ran is a
    /// harmless no-op because the registry is simply empty already.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        *registry = NodeRegistry::new();
        drop(registry);
        self.shutdown.notify_one();
        info!("tracker shut down");
    }

    async fn handle_connection(self: &Arc<Self>, stream: TcpStream, host: String) -> Result<(), TrackerError> {
        let (read_half, write_half) = stream.into_split();
        let mut read_half = read_half;
        let mut write_half = write_half;

        let mut state = ConnectionState::Greeting;

        // Step 1: NODE_KEYS, plaintext.
        let (candidate_public, candidate_verify) = recv_plain(&mut read_half).await?.expect_node_keys()?;
        let candidate_public_key: ledger_crypto::PublicKey = (&candidate_public).try_into()?;
        let candidate_verify_key: ledger_crypto::VerifyingKey = (&candidate_verify).try_into()?;
        state = ConnectionState::Identified;
        debug!(?state, "received NODE_KEYS");

        // Step 2: assign the identity and send it back in the clear.
        let ident = self.registry.lock().await.reserve_ident();
        send_plain(
            &mut write_half,
            &Message::TrackerIdent {
                ident,
                public_key: KeyBytes::from(&self.public_key()),
                verify_key: KeyBytes::from(&self.verifying_key()),
            },
        )
        .await?;

        // Step 3: NODE_IDENT, now encrypted — this is the first message that
        // proves the node holds the private half of the keys it just sent.
        recv_encrypted(&mut read_half, &self.keypair, &candidate_verify_key, &candidate_public_key)
            .await?
            .expect_node_ident()?;

        // Step 4: hand over the chain snapshot.
        let snapshot = self.chain.lock().await.clone();
        send_encrypted(
            &mut write_half,
            &self.keypair,
            &candidate_public_key,
            &Message::TrackerChain { blockchain: snapshot },
        )
        .await?;
        state = ConnectionState::Snapshotted;
        debug!(ident, ?state, "sent TRACKER_CHAIN");

        // Step 5: the node's own listen port.
        let port = recv_encrypted(&mut read_half, &self.keypair, &candidate_verify_key, &candidate_public_key)
            .await?
            .expect_node_port()?;
        state = ConnectionState::PortKnown;

        // Step 6: go-ahead / ack that the node's listener is bound.
        send_encrypted(&mut write_half, &self.keypair, &candidate_public_key, &Message::NodeListen {}).await?;
        recv_encrypted(&mut read_half, &self.keypair, &candidate_verify_key, &candidate_public_key)
            .await?
            .expect_node_listen()?;
        state = ConnectionState::Listening;
        debug!(ident, ?state, "node confirmed its listener is bound");

        // Step 7: the peers already admitted.
        let peers = self.registry.lock().await.snapshot_peers();
        send_encrypted(
            &mut write_half,
            &self.keypair,
            &candidate_public_key,
            &Message::TrackerPeers { peers },
        )
        .await?;

        // Step 8: ack.
        recv_encrypted(&mut read_half, &self.keypair, &candidate_verify_key, &candidate_public_key)
            .await?
            .expect_node_peers()?;
        state = ConnectionState::Peered;
        debug!(ident, ?state, "sent TRACKER_PEERS");

        // Steps 9-11: all under one registry-lock acquisition, so every
        // existing node's TRACKER_NEW_PEER reaches it strictly before this
        // node's own TRACKER_ACCEPT reaches it — existing peers can then
        // recognise the incoming dial.
        let descriptor = PeerDescriptor::new(ident, host, port, candidate_public, candidate_verify);
        {
            let mut registry = self.registry.lock().await;
            for existing in registry.idents() {
                let existing_descriptor = match registry.get(existing) {
                    Some(d) => d.clone(),
                    None => continue,
                };
                let existing_public: ledger_crypto::PublicKey = match (&existing_descriptor.public_key).try_into() {
                    Ok(k) => k,
                    Err(_) => continue,
                };
                if let Some(socket) = registry.socket_mut(existing) {
                    if let Err(err) = send_encrypted(
                        socket,
                        &self.keypair,
                        &existing_public,
                        &Message::TrackerNewPeer { peer: descriptor.clone() },
                    )
                    .await
                    {
                        warn!(existing, error = %err, "failed to notify existing node of new peer");
                    }
                }
            }

            registry.commit(descriptor, write_half);
            if let Some(socket) = registry.socket_mut(ident) {
                send_encrypted(socket, &self.keypair, &candidate_public_key, &Message::TrackerAccept {}).await?;
            }
        }
        state = ConnectionState::Accepted;
        info!(ident, ?state, "node admitted");

        state = ConnectionState::Monitoring;
        debug!(ident, ?state, "entering monitoring loop");
        self.monitor(ident, read_half, candidate_verify_key, candidate_public_key).await;
        Ok(())
    }

    /// Read frames from an admitted node until the link breaks or the node
    /// says goodbye. `PEER_BLOCK` is mirrored into the tracker's own chain
    /// (informational only: no nonce validation, no rebroadcast); any other
    /// kind, or a framing/crypto failure, closes the link.
    async fn monitor(
        self: &Arc<Self>,
        ident: u64,
        mut read_half: tokio::net::tcp::OwnedReadHalf,
        verify_key: ledger_crypto::VerifyingKey,
        public_key: ledger_crypto::PublicKey,
    ) {
        loop {
            let message = match recv_encrypted(&mut read_half, &self.keypair, &verify_key, &public_key).await {
                Ok(m) => m,
                Err(err) => {
                    warn!(ident, error = %err, "node link broken");
                    break;
                }
            };

            match message {
                Message::NodeDisconnect {} => {
                    info!(ident, "node disconnected");
                    break;
                }
                Message::PeerBlock { block } => {
                    self.chain.lock().await.add_block(block);
                    debug!(ident, "mirrored PEER_BLOCK into tracker chain");
                }
                other => {
                    warn!(ident, kind = other.kind(), "unexpected message kind while monitoring");
                    break;
                }
            }
        }

        self.registry.lock().await.remove(ident);
    }
}
