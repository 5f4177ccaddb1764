use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledger_chain::{Block, Blockchain, Transaction};
use ledger_crypto::{KeyPair, PublicKey, VerifyingKey};
use ledger_peer::{PeerDescriptor, PeerTable};
use ledger_pow::MiningSignal;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, Mutex};

/// Everything about a node that is mutated by more than one task: the
/// tracker reader, the accept loop, per-peer readers, the mining
/// coordinator, and the user's REPL commands. Kept behind a single mutex on
/// [`SharedState`] so every structural mutation happens under a single
/// per-node mutex.
pub struct NodeInner {
    pub chain: Blockchain,
    pub peers: PeerTable,
    pub peer_sockets: HashMap<u64, OwnedWriteHalf>,
    pub block_queue: Option<mpsc::UnboundedSender<MiningSignal>>,
    pub rejected: Vec<u64>,
}

impl NodeInner {
    fn new(chain: Blockchain, peers: PeerTable) -> Self {
        Self { chain, peers, peer_sockets: HashMap::new(), block_queue: None, rejected: Vec::new() }
    }
}

/// The full state of an admitted node, shared via `Arc` across every task
/// it spawns.
pub struct SharedState {
    pub ident: u64,
    pub keypair: KeyPair,
    pub tracker_public: PublicKey,
    pub tracker_verify: VerifyingKey,
    pub tracker_socket: Mutex<Option<OwnedWriteHalf>>,
    pub listen_port: u16,
    pub difficulty: usize,
    /// Cleared to `false` the moment the node disconnects, by user command
    /// or by losing the tracker link; the REPL loop in `main.rs` exits as
    /// soon as it observes this.
    connected: AtomicBool,
    inner: Mutex<NodeInner>,
}

pub type Node = Arc<SharedState>;

impl SharedState {
    pub fn new(
        ident: u64,
        keypair: KeyPair,
        tracker_public: PublicKey,
        tracker_verify: VerifyingKey,
        tracker_socket: OwnedWriteHalf,
        chain: Blockchain,
        peers: PeerTable,
        listen_port: u16,
        difficulty: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            ident,
            keypair,
            tracker_public,
            tracker_verify,
            tracker_socket: Mutex::new(Some(tracker_socket)),
            listen_port,
            difficulty,
            connected: AtomicBool::new(true),
            inner: Mutex::new(NodeInner::new(chain, peers)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, NodeInner> {
        self.inner.lock().await
    }

    pub async fn chain_snapshot(&self) -> Blockchain {
        self.lock().await.chain.clone()
    }

    pub async fn peers_snapshot(&self) -> Vec<PeerDescriptor> {
        self.lock().await.peers.snapshot()
    }

    pub async fn balance(&self) -> i64 {
        self.lock().await.chain.balance(self.ident)
    }

    /// Validate and pool `tx`. Returns `(accepted, pool_size_after)`; the
    /// caller decides whether the pool has crossed the mining threshold.
    pub async fn add_unconfirmed(&self, tx: Transaction) -> (bool, usize) {
        self.lock().await.chain.add_unconfirmed(tx)
    }

    /// Peers whose handshake failed, in the order they failed.
    pub async fn rejected_peers(&self) -> Vec<u64> {
        self.lock().await.rejected.clone()
    }

    /// Insert a peer descriptor the tracker handed us (`TRACKER_PEERS` or
    /// `TRACKER_NEW_PEER`). Does not dial; dialing is a separate, explicit
    /// step.
    pub async fn insert_peer(&self, descriptor: PeerDescriptor) {
        self.lock().await.peers.insert(descriptor);
    }

    pub async fn register_peer_socket(&self, ident: u64, socket: OwnedWriteHalf) {
        self.lock().await.peer_sockets.insert(ident, socket);
    }

    /// Remove a peer from both the directory and the socket table.
    /// Idempotent.
    pub async fn remove_peer(&self, ident: u64) {
        let mut inner = self.lock().await;
        inner.peers.remove(ident);
        inner.peer_sockets.remove(&ident);
    }

    pub async fn reject_peer(&self, ident: u64) {
        let mut inner = self.lock().await;
        inner.rejected.push(ident);
        inner.peers.remove(ident);
        inner.peer_sockets.remove(&ident);
    }

    /// Push the sentinel onto the mining coordinator's result channel (if
    /// one is running) and append `block`, in one lock acquisition so the
    /// wake-up and the append are atomic with respect to any other append.
    pub async fn absorb_block(&self, block: Block) {
        let mut inner = self.lock().await;
        if let Some(sender) = inner.block_queue.as_ref() {
            let _ = sender.send(MiningSignal::Stop);
        }
        inner.chain.add_block(block);
    }

    /// Append a block this node itself mined (or is otherwise the origin
    /// of), clearing the pool, before it gets broadcast.
    pub async fn append_mined_block(&self, block: Block) {
        self.lock().await.chain.add_block(block);
    }

    /// Snapshot the candidate material for a proof-of-work search and
    /// install `sender` as the mining coordinator's result channel.
    pub async fn begin_mining(&self, sender: mpsc::UnboundedSender<MiningSignal>) -> (Vec<Transaction>, String) {
        let mut inner = self.lock().await;
        inner.block_queue = Some(sender);
        (inner.chain.unconfirmed().to_vec(), inner.chain.tip().hash_hex())
    }

    pub async fn end_mining(&self) {
        self.lock().await.block_queue = None;
    }
}
