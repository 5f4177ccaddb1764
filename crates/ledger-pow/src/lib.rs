pub mod worker;

pub use worker::{MiningSignal, PowHandle};
