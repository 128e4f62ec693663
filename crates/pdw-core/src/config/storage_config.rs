use serde::{Deserialize, Serialize};

/// Blob store network selection. `Local` must be chosen explicitly, never defaulted to
/// silently — see `pdw-blobstore`'s `BlobStore::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageNetwork {
    Local,
    Testnet,
    Mainnet,
}

impl Default for StorageNetwork {
    fn default() -> Self {
        StorageNetwork::Testnet
    }
}

/// Blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub network: StorageNetwork,
    pub cache_ttl_s: u64,
    pub cache_max_entries: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            network: StorageNetwork::default(),
            cache_ttl_s: 300,
            cache_max_entries: 1000,
        }
    }
}
