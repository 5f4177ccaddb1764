use serde::{Deserialize, Serialize};

/// Ident reserved for the genesis sender/receiver and for the "credited to
/// every observer" minting rule (see [`crate::blockchain::Blockchain::balance`]).
pub const GENESIS_IDENT: u64 = 0;

/// A plain ledger transfer. Transactions carry no signature of their own —
/// authentication happens at the link level (every peer channel is
/// encrypted and signed), not per-transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: u64,
    pub receiver: u64,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: u64, receiver: u64, amount: u64) -> Self {
        Self { sender, receiver, amount }
    }

    pub(crate) fn genesis(amount: u64) -> Self {
        Self { sender: GENESIS_IDENT, receiver: GENESIS_IDENT, amount }
    }
}
