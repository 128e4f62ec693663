use serde::{Deserialize, Serialize};

/// HNSW index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    pub max_elements: usize,
    pub m: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            max_elements: 100_000,
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}
