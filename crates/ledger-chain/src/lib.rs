pub mod block;
pub mod blockchain;
pub mod error;
pub mod transaction;

pub use block::{Block, GENESIS_AMOUNT, GENESIS_PREVIOUS_HASH};
pub use blockchain::{satisfies_difficulty, Blockchain, DEFAULT_DIFFICULTY, MINING_THRESHOLD};
pub use error::ChainError;
pub use transaction::{Transaction, GENESIS_IDENT};
