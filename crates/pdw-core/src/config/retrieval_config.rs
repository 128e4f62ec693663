use serde::{Deserialize, Serialize};

/// Retrieval & query engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// `k' = max(k, overfetch_factor * k)` fetched from the ANN index
    /// before category/time/similarity filtering, to absorb filter loss.
    pub overfetch_factor: usize,
    /// Total `context_string` size budget for `assemble_context`, in UTF-8
    /// bytes.
    pub context_char_budget: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 4,
            context_char_budget: 8_000,
        }
    }
}
