/// Runtime configuration for a node: a plain data struct with a `Default`
/// impl and a builder-style constructor for the one shape this binary is
/// ever built with.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host the tracker listens on.
    pub tracker_host: String,

    /// Port the tracker listens on.
    pub tracker_port: u16,

    /// Port this node listens on for peer dials.
    pub listen_port: u16,

    /// Suppress log output to stderr.
    pub quiet: bool,

    /// Leading hex nibbles of a block's hash that must be zero. Not exposed
    /// as a CLI flag (the binary documents none); overridable only through
    /// this struct, e.g. by tests that need proof-of-work to finish fast.
    pub difficulty: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            tracker_host: "127.0.0.1".to_string(),
            tracker_port: 7000,
            listen_port: 7100,
            quiet: false,
            difficulty: ledger_chain::DEFAULT_DIFFICULTY,
        }
    }
}

impl NodeConfig {
    pub fn connecting_to(tracker_port: u16, listen_port: u16) -> Self {
        Self { tracker_port, listen_port, ..Self::default() }
    }

    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }
}
