use serde::{Deserialize, Serialize};

/// Access/consent engine configuration. `session.ttl_min` lives logically
/// here alongside the rest of the consent surface, and is duplicated onto
/// `EncryptionConfig::session_ttl_min` — that's the field the encryption
/// engine actually reads when minting session keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Maximum number of pending consent requests retained per user.
    pub max_pending_requests: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_pending_requests: 50,
        }
    }
}
