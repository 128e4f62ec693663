use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment assigned by the content classifier (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// A plaintext memory record. Transient in the core: it exists in memory
/// only long enough to be classified, embedded, encrypted, and persisted —
/// no plaintext is ever written to the blob store.
///
/// Immutable after creation except `topic` and `importance`, which the
/// owner may revise via `update_memory_metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub owner: String,
    pub content: String,
    pub category: String,
    pub topic: Option<String>,
    /// 1..=10, enforced by [`Memory::set_importance`].
    pub importance: u8,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub custom_kv: BTreeMap<String, String>,
}

impl Memory {
    pub fn new(id: impl Into<String>, owner: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            content: content.into(),
            category: "general".to_string(),
            topic: None,
            importance: 5,
            created_at: Utc::now(),
            tags: Vec::new(),
            custom_kv: BTreeMap::new(),
        }
    }

    /// blake3 content hash, used to detect tampering after decryption
    ///.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.content.as_bytes()).to_hex().to_string()
    }

    /// Clamp importance into the documented `[1, 10]` range rather than
    /// silently accepting out-of-range values.
    pub fn set_importance(&mut self, importance: u8) {
        self.importance = importance.clamp(1, 10);
    }
}

/// Persisted alongside the encrypted blob. `content_hash` is the
/// *plaintext* hash so a decryptor can detect tampering after decrypt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub content_type: String,
    pub content_size: u64,
    pub content_hash: String,
    pub category: String,
    pub topic: Option<String>,
    pub importance: u8,
    pub embedding_blob_id: Option<String>,
    pub embedding_dimension: Option<u32>,
    pub created_ts: DateTime<Utc>,
    pub updated_ts: DateTime<Utc>,
    pub custom_kv: BTreeMap<String, String>,
}

impl MemoryMetadata {
    pub fn for_memory(memory: &Memory, content_type: &str) -> Self {
        let now = Utc::now();
        Self {
            content_type: content_type.to_string(),
            content_size: memory.content.len() as u64,
            content_hash: memory.content_hash(),
            category: memory.category.clone(),
            topic: memory.topic.clone(),
            importance: memory.importance,
            embedding_blob_id: None,
            embedding_dimension: None,
            created_ts: now,
            updated_ts: now,
            custom_kv: memory.custom_kv.clone(),
        }
    }

    /// Verify a decrypted plaintext still hashes to the recorded value.
    /// Callers surface [`pdw_core::errors::ErrorKind::Tampered`] on mismatch.
    pub fn verify(&self, plaintext: &[u8]) -> bool {
        blake3::hash(plaintext).to_hex().to_string() == self.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_clamps_into_range() {
        let mut m = Memory::new("m1", "0xUA", "hello");
        m.set_importance(0);
        assert_eq!(m.importance, 1);
        m.set_importance(255);
        assert_eq!(m.importance, 10);
        m.set_importance(7);
        assert_eq!(m.importance, 7);
    }

    #[test]
    fn metadata_verify_round_trips() {
        let memory = Memory::new("m1", "0xUA", "my cat's name is zephyr");
        let meta = MemoryMetadata::for_memory(&memory, "text/plain");
        assert!(meta.verify(memory.content.as_bytes()));
        assert!(!meta.verify(b"tampered"));
    }
}
