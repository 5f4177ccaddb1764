use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// `previous_block_hash` used by the genesis block; not a real hash.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Initial balance minted to every observer via the genesis transaction.
pub const GENESIS_AMOUNT: u64 = 10;

/// A single block in the chain.
///
/// `hash()` covers exactly the fields serialised here, in this field order —
/// the order is part of the hash's definition, since it is computed over the
/// canonical JSON encoding of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    pub previous_block_hash: String,
    pub timestamp: String,
    pub nonce: u64,
}

impl Block {
    /// Build a candidate block for proof-of-work: same transactions and
    /// previous-hash throughout the search, only `nonce` varies between
    /// iterations.
    pub fn candidate(transactions: Vec<Transaction>, previous_block_hash: String, nonce: u64) -> Self {
        Self {
            transactions,
            previous_block_hash,
            timestamp: format_timestamp(),
            nonce,
        }
    }

    /// The synthetic first block: `{sender:0, receiver:0,
    /// amount:GENESIS_AMOUNT}`, linked to `GENESIS_PREVIOUS_HASH`.
    pub fn genesis() -> Self {
        Self {
            transactions: vec![Transaction::genesis(GENESIS_AMOUNT)],
            previous_block_hash: GENESIS_PREVIOUS_HASH.to_string(),
            timestamp: format_timestamp(),
            nonce: 0,
        }
    }

    /// `SHA-256(canonical-JSON(transactions, previous_block_hash,
    /// timestamp, nonce))`.
    pub fn hash(&self) -> [u8; 32] {
        // serde_json preserves struct field declaration order, which is
        // what makes this encoding "canonical" for hashing purposes: the
        // same block always serialises to the same bytes.
        let encoded = serde_json::to_vec(self).expect("Block serialises infallibly");
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

fn format_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hash_is_stable_for_equal_fields() {
        let a = Block {
            transactions: vec![Transaction::genesis(GENESIS_AMOUNT)],
            previous_block_hash: GENESIS_PREVIOUS_HASH.to_string(),
            timestamp: "2026-01-01 00:00:00.000000".to_string(),
            nonce: 0,
        };
        let b = a.clone();
        assert_eq!(a.hash_hex(), b.hash_hex());
    }

    #[test]
    fn nonce_change_changes_hash() {
        let base = Block::candidate(vec![], GENESIS_PREVIOUS_HASH.to_string(), 0);
        let mut bumped = base.clone();
        bumped.nonce = 1;
        assert_ne!(base.hash_hex(), bumped.hash_hex());
    }
}
