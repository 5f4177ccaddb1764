pub mod config;
pub mod error;
pub mod registry;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use registry::NodeRegistry;
pub use tracker::Tracker;
