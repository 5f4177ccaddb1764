/// Runtime configuration for a [`crate::Tracker`]-driving binary.
///
/// The protocol names no tunable beyond the listen port, so this stays
/// small; it exists mainly so `main.rs` has a single place to hold the
/// parsed CLI input.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Suppress log output to stderr.
    pub quiet: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { port: 7000, quiet: false }
    }
}

impl TrackerConfig {
    pub fn on_port(port: u16) -> Self {
        Self { port, ..Self::default() }
    }
}
