use serde::{Deserialize, Serialize};

/// Threshold IBE configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub threshold_t: u32,
    pub servers_n: u32,
    pub session_ttl_min: u32,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_t: 2,
            servers_n: 3,
            session_ttl_min: 30,
        }
    }
}
