use std::sync::Arc;

use ledger_chain::{Block, Transaction, MINING_THRESHOLD};
use ledger_pow::{MiningSignal, PowHandle};
use tokio::sync::mpsc;
use tracing::info;

use crate::admission::inform_tracker_of_block;
use crate::broadcast::{broadcast_block, broadcast_transaction};
use crate::state::SharedState;

/// `send(receiver, amount)`: build a transaction from this node, broadcast
/// it to every peer, and feed it to the local inbound handler exactly like
/// a transaction received over the wire.
pub async fn send_transaction(state: &Arc<SharedState>, receiver: u64, amount: u64) {
    let tx = Transaction::new(state.ident, receiver, amount);
    broadcast_transaction(state, &tx).await;
    inbound_transaction(Arc::clone(state), tx).await;
}

/// Validate and pool an incoming (or locally originated) transaction. If
/// the pool exactly reaches the mining threshold, spawn a mining
/// coordinator. The equality (not `>=`) is the source's own rule: under
/// races the threshold can be skipped, and this is preserved rather than
/// hardened.
pub async fn inbound_transaction(state: Arc<SharedState>, tx: Transaction) {
    let (accepted, pool_size) = state.add_unconfirmed(tx).await;
    if !accepted {
        return;
    }
    if pool_size == MINING_THRESHOLD {
        tokio::spawn(run_mining_coordinator(state));
    }
}

/// Start a proof-of-work search over the current pool, wait for either a
/// locally mined block or a `Stop` sentinel pushed by an accepted peer
/// block, and settle accordingly.
async fn run_mining_coordinator(state: Arc<SharedState>) {
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<MiningSignal>();
    let (transactions, previous_hash) = state.begin_mining(result_tx.clone()).await;

    let handle = PowHandle::spawn(transactions, previous_hash, state.difficulty, result_tx);

    match result_rx.recv().await {
        Some(MiningSignal::Found(block)) => {
            info!(ident = state.ident, hash = %block.hash_hex(), "mined a block");
            send_block(&state, block).await;
        }
        Some(MiningSignal::Stop) | None => {
            // A peer's block already won the race and has been appended by
            // the inbound-block handler; just stop our own search.
            handle.stop().await;
            info!(ident = state.ident, "mining search pre-empted by a peer's block");
        }
    }

    state.end_mining().await;
}

/// Append a block this node originated, then broadcast it to every peer
/// and (informationally) to the tracker.
pub async fn send_block(state: &Arc<SharedState>, block: Block) {
    state.append_mined_block(block.clone()).await;
    broadcast_block(state, &block).await;
    inform_tracker_of_block(state, &block).await;
}
