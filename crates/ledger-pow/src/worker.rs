use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ledger_chain::{satisfies_difficulty, Block, Transaction};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Whatever arrives on a mining coordinator's result channel: either a
/// freshly mined block, or a wake-up sentinel pushed by the coordinator
/// itself when a peer's block made the local search moot.
#[derive(Debug, Clone)]
pub enum MiningSignal {
    Found(Block),
    Stop,
}

/// A running (or finished) proof-of-work search. Dropping this without
/// calling [`PowHandle::stop`] leaves the worker thread running to
/// completion or cancellation is never requested — callers that originate a
/// search are expected to always route it through `stop`.
pub struct PowHandle {
    cancel: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
}

impl PowHandle {
    /// Start searching for a nonce over `(transactions, previous_block_hash)`
    /// that satisfies `difficulty`. Delivers at most one [`MiningSignal::Found`]
    /// on `result` if the search completes before cancellation.
    pub fn spawn(
        transactions: Vec<Transaction>,
        previous_block_hash: String,
        difficulty: usize,
        result: UnboundedSender<MiningSignal>,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = cancel.clone();
        let join = thread::spawn(move || {
            run(transactions, previous_block_hash, difficulty, worker_cancel, result)
        });
        Self { cancel, join: Some(join) }
    }

    /// Set the cancellation flag and block until the worker thread notices
    /// and exits. Safe to call even after the worker already delivered a
    /// block; the flag check only matters while the loop is still running.
    pub async fn stop(mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = tokio::task::spawn_blocking(move || join.join()).await;
        }
    }
}

fn run(
    transactions: Vec<Transaction>,
    previous_block_hash: String,
    difficulty: usize,
    cancel: Arc<AtomicBool>,
    result: UnboundedSender<MiningSignal>,
) {
    let mut nonce = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(nonce, "proof-of-work cancelled");
            return;
        }

        let candidate = Block::candidate(transactions.clone(), previous_block_hash.clone(), nonce);
        if satisfies_difficulty(&candidate.hash_hex(), difficulty) {
            debug!(nonce, hash = %candidate.hash_hex(), "proof-of-work found a block");
            let _ = result.send(MiningSignal::Found(candidate));
            return;
        }

        nonce = nonce.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn finds_a_block_at_trivial_difficulty() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PowHandle::spawn(vec![], "0".to_string(), 0, tx);

        match rx.recv().await {
            Some(MiningSignal::Found(block)) => {
                assert!(satisfies_difficulty(&block.hash_hex(), 0));
            }
            other => panic!("expected a found block, got {other:?}"),
        }
        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_cancels_before_a_high_difficulty_search_finishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PowHandle::spawn(vec![], "0".to_string(), 64, tx);

        // Give the worker a moment to start looping, then cancel it.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handle.stop().await;

        // No block should ever have been delivered for an unreachable
        // difficulty in this short a window.
        assert!(rx.try_recv().is_err());
    }
}
