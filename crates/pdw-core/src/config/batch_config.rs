use serde::{Deserialize, Serialize};

/// Batch coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_pending: usize,
    pub max_delay_ms: u64,
    pub max_cas_retries: u32,
    /// Idle duration after which a user's in-memory state is evicted from
    /// the process-wide registry.
    pub idle_eviction_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_pending: 100,
            max_delay_ms: 2000,
            max_cas_retries: 5,
            idle_eviction_secs: 600,
        }
    }
}
