use serde::{Deserialize, Serialize};

/// Pipeline orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rollback_on_failure: bool,
    pub skip_failed_steps: bool,
    pub max_retry_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            skip_failed_steps: false,
            max_retry_attempts: 3,
        }
    }
}
