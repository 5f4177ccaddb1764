pub mod admission;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mining;
pub mod peer;
pub mod state;

pub use admission::admit;
pub use config::NodeConfig;
pub use error::NodeError;
pub use lifecycle::disconnect;
pub use mining::send_transaction;
pub use state::{Node, SharedState};
