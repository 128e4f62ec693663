//! Configuration tree. Every documented setting has a corresponding field
//! here with its default, loadable from TOML.

mod access_config;
mod batch_config;
mod embedding_config;
mod encryption_config;
mod graph_config;
mod pipeline_config;
mod retrieval_config;
mod storage_config;
mod vector_config;

pub use access_config::AccessConfig;
pub use batch_config::BatchConfig;
pub use embedding_config::EmbeddingConfig;
pub use encryption_config::EncryptionConfig;
pub use graph_config::GraphConfig;
pub use pipeline_config::PipelineConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::{StorageConfig, StorageNetwork};
pub use vector_config::VectorIndexConfig;

use serde::{Deserialize, Serialize};

use crate::errors::PdwError;

/// The full configuration tree. Each field is a per-subsystem struct with
/// its own `#[serde(default)]`, so a TOML document only needs to override
/// the keys it cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdwConfig {
    pub embedding: EmbeddingConfig,
    pub vector: VectorIndexConfig,
    pub graph: GraphConfig,
    pub encryption: EncryptionConfig,
    pub storage: StorageConfig,
    pub batch: BatchConfig,
    pub pipeline: PipelineConfig,
    pub access: AccessConfig,
    pub retrieval: RetrievalConfig,
}

impl PdwConfig {
    pub fn from_toml(text: &str) -> Result<Self, PdwError> {
        toml::from_str(text).map_err(|e| PdwError::invalid_input(format!("invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_documented_defaults() {
        let config = PdwConfig::from_toml("").unwrap();
        assert_eq!(config.batch.max_pending, 100);
        assert_eq!(config.batch.max_delay_ms, 2000);
        assert_eq!(config.encryption.threshold_t, 2);
        assert_eq!(config.encryption.servers_n, 3);
    }

    #[test]
    fn partial_overrides_preserve_other_defaults() {
        let config = PdwConfig::from_toml("[batch]\nmax_pending = 50\n").unwrap();
        assert_eq!(config.batch.max_pending, 50);
        assert_eq!(config.batch.max_delay_ms, 2000);
    }
}
