use serde::{Deserialize, Serialize};

/// Knowledge-graph extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub enabled: bool,
    pub confidence_threshold: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.5,
        }
    }
}
