use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The on-chain object pointing at a user's latest `(index_blob_id,
/// graph_blob_id)` pair, with a monotonic `version` used for CAS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryIndexRoot {
    pub owner: String,
    pub index_blob_id: String,
    pub graph_blob_id: String,
    pub version: u64,
    pub updated_ts: DateTime<Utc>,
}

impl MemoryIndexRoot {
    pub fn genesis(owner: impl Into<String>, index_blob_id: impl Into<String>, graph_blob_id: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            index_blob_id: index_blob_id.into(),
            graph_blob_id: graph_blob_id.into(),
            version: 1,
            updated_ts: Utc::now(),
        }
    }

    /// Produce the next version, as published by a successful CAS write.
    /// Strictly increases `version`.
    pub fn next(&self, index_blob_id: impl Into<String>, graph_blob_id: impl Into<String>) -> Self {
        Self {
            owner: self.owner.clone(),
            index_blob_id: index_blob_id.into(),
            graph_blob_id: graph_blob_id.into(),
            version: self.version + 1,
            updated_ts: Utc::now(),
        }
    }
}
