//! Configuration types for the subscription ledger

use std::time::Duration;

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How far ahead of the end date the expiry warning fires
    pub expiry_warning: Duration,
    /// Page size cap for history queries
    pub max_page_size: i64,
}

impl LedgerConfig {
    /// Create a config with defaults (3-day warning window)
    pub fn new() -> Self {
        Self {
            expiry_warning: Duration::from_secs(3 * 24 * 60 * 60),
            max_page_size: 100,
        }
    }

    /// Set the expiry warning window
    pub fn with_expiry_warning(mut self, window: Duration) -> Self {
        self.expiry_warning = window;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new()
    }
}
