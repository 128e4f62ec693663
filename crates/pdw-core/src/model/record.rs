use serde::{Deserialize, Serialize};

use super::memory::MemoryMetadata;

/// The on-chain record for a single memory. Created
/// once per memory; deletable by the owner only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub owner: String,
    pub memory_id: String,
    pub category: String,
    pub vector_id: u64,
    pub blob_id: String,
    pub metadata: MemoryMetadata,
}
