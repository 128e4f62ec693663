//! In-memory stand-in for the on-chain ownership registry. Builds its own
//! opaque transactions the same way `pdw-registry`'s real client does
//! (bincode-encoded tagged enum), and additionally knows how to *apply*
//! one against its own state — something a real chain client never does,
//! but a fake needs in order to let tests exercise the CAS-retry path.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use pdw_core::errors::{ErrorKind, PdwError, PdwResult};
use pdw_core::model::{AccessGrant, MemoryIndexRoot, MemoryMetadata, MemoryRecord};
use pdw_core::traits::{CreateMemoryRecordArgs, IOwnershipRegistry, UnsignedTx, UpdateMemoryIndexArgs};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FakeCall {
    CreateMemoryRecord { category: String, vector_id: u64, blob_id: String, metadata: MemoryMetadata },
    DeleteMemory { memory_id: String },
    UpdateMemoryMetadata { memory_id: String, new_topic: Option<String>, new_importance: Option<u8> },
    CreateMemoryIndex { index_blob_id: String, graph_blob_id: String },
    UpdateMemoryIndex { memory_index: String, expected_version: u64, new_index_blob_id: String, new_graph_blob_id: String },
}

fn encode(call: FakeCall) -> PdwResult<UnsignedTx> {
    bincode::serialize(&call).map(UnsignedTx).map_err(|e| PdwError::internal(format!("fake tx encode failed: {e}")))
}

#[derive(Default)]
pub struct FakeOwnershipRegistry {
    memories: DashMap<String, MemoryRecord>,
    indexes: DashMap<String, MemoryIndexRoot>,
    grants: DashMap<String, AccessGrant>,
    /// Number of `UpdateMemoryIndex` applications to reject with `Conflict`
    /// before letting one through, for exercising CAS retry loops.
    reject_next_updates: DashMap<String, u32>,
}

impl FakeOwnershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_access_grant(&self, grant: AccessGrant) {
        self.grants.insert(grant.id.clone(), grant);
    }

    /// Makes the next `n` `UpdateMemoryIndex` applications for `owner` fail
    /// with `Conflict`, as if another writer won the race.
    pub fn force_conflicts(&self, owner: &str, n: u32) {
        self.reject_next_updates.insert(owner.to_string(), n);
    }

    /// Applies a previously built transaction on behalf of `owner` — the
    /// in-memory analogue of signing and broadcasting.
    pub fn apply_as(&self, owner: &str, tx: &UnsignedTx) -> PdwResult<()> {
        let call: FakeCall = bincode::deserialize(&tx.0).map_err(|e| PdwError::internal(format!("fake tx decode failed: {e}")))?;
        match call {
            FakeCall::CreateMemoryRecord { category, vector_id, blob_id, metadata } => {
                let memory_id = uuid::Uuid::new_v4().to_string();
                self.memories.insert(
                    memory_id.clone(),
                    MemoryRecord { owner: owner.to_string(), memory_id, category, vector_id, blob_id, metadata },
                );
                Ok(())
            }
            FakeCall::DeleteMemory { memory_id } => {
                match self.memories.get(&memory_id) {
                    Some(record) if record.owner == owner => {
                        drop(record);
                        self.memories.remove(&memory_id);
                        Ok(())
                    }
                    Some(_) => Err(PdwError::unauthorized(format!("{owner} does not own memory {memory_id}"))),
                    None => Err(PdwError::not_found(format!("no such memory: {memory_id}"))),
                }
            }
            FakeCall::UpdateMemoryMetadata { memory_id, new_topic, new_importance } => {
                let mut record = self
                    .memories
                    .get_mut(&memory_id)
                    .ok_or_else(|| PdwError::not_found(format!("no such memory: {memory_id}")))?;
                if record.owner != owner {
                    return Err(PdwError::unauthorized(format!("{owner} does not own memory {memory_id}")));
                }
                if let Some(topic) = new_topic {
                    record.metadata.topic = Some(topic);
                }
                if let Some(importance) = new_importance {
                    record.metadata.importance = importance;
                }
                Ok(())
            }
            FakeCall::CreateMemoryIndex { index_blob_id, graph_blob_id } => {
                if self.indexes.contains_key(owner) {
                    return Err(PdwError::conflict(format!("memory index already exists for {owner}")));
                }
                self.indexes.insert(owner.to_string(), MemoryIndexRoot::genesis(owner, index_blob_id, graph_blob_id));
                Ok(())
            }
            FakeCall::UpdateMemoryIndex { memory_index, expected_version, new_index_blob_id, new_graph_blob_id } => {
                if let Some(remaining) = self.reject_next_updates.get(&memory_index).map(|r| *r) {
                    if remaining > 0 {
                        self.reject_next_updates.insert(memory_index.clone(), remaining - 1);
                        return Err(PdwError::conflict("forced conflict for test"));
                    }
                }
                let mut root = self
                    .indexes
                    .get_mut(&memory_index)
                    .ok_or_else(|| PdwError::not_found(format!("no memory index for {memory_index}")))?;
                if root.version != expected_version {
                    return Err(PdwError::conflict(format!("expected version {expected_version}, found {}", root.version)));
                }
                *root = root.next(new_index_blob_id, new_graph_blob_id);
                Ok(())
            }
        }
    }
}

impl IOwnershipRegistry for FakeOwnershipRegistry {
    fn build_create_memory_record(&self, args: CreateMemoryRecordArgs<'_>) -> PdwResult<UnsignedTx> {
        encode(FakeCall::CreateMemoryRecord {
            category: args.category.to_string(),
            vector_id: args.vector_id,
            blob_id: args.blob_id.to_string(),
            metadata: args.metadata.clone(),
        })
    }

    fn build_delete_memory(&self, memory_id: &str) -> PdwResult<UnsignedTx> {
        encode(FakeCall::DeleteMemory { memory_id: memory_id.to_string() })
    }

    fn build_update_memory_metadata(&self, memory_id: &str, new_topic: Option<&str>, new_importance: Option<u8>) -> PdwResult<UnsignedTx> {
        encode(FakeCall::UpdateMemoryMetadata {
            memory_id: memory_id.to_string(),
            new_topic: new_topic.map(str::to_string),
            new_importance,
        })
    }

    fn build_create_memory_index(&self, index_blob_id: &str, graph_blob_id: &str) -> PdwResult<UnsignedTx> {
        encode(FakeCall::CreateMemoryIndex { index_blob_id: index_blob_id.to_string(), graph_blob_id: graph_blob_id.to_string() })
    }

    fn build_update_memory_index(&self, args: UpdateMemoryIndexArgs<'_>) -> PdwResult<UnsignedTx> {
        encode(FakeCall::UpdateMemoryIndex {
            memory_index: args.memory_index.to_string(),
            expected_version: args.expected_version,
            new_index_blob_id: args.new_index_blob_id.to_string(),
            new_graph_blob_id: args.new_graph_blob_id.to_string(),
        })
    }

    fn get_memory(&self, memory_id: &str) -> PdwResult<Option<MemoryRecord>> {
        Ok(self.memories.get(memory_id).map(|r| r.value().clone()))
    }

    fn get_memory_index(&self, owner: &str) -> PdwResult<Option<MemoryIndexRoot>> {
        Ok(self.indexes.get(owner).map(|r| r.value().clone()))
    }

    fn list_user_memories(&self, owner: &str) -> PdwResult<Vec<MemoryRecord>> {
        Ok(self.memories.iter().filter(|entry| entry.value().owner == owner).map(|entry| entry.value().clone()).collect())
    }

    fn get_access_grant(&self, grant_id: &str) -> PdwResult<Option<AccessGrant>> {
        Ok(self.grants.get(grant_id).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdw_core::model::Memory;

    #[test]
    fn create_then_list_round_trips() {
        let registry = FakeOwnershipRegistry::new();
        let memory = Memory::new("m1", "0xUA", "hi");
        let metadata = MemoryMetadata::for_memory(&memory, "text/plain");
        let tx = registry
            .build_create_memory_record(CreateMemoryRecordArgs { category: "general", vector_id: 1, blob_id: "blob-1", metadata: &metadata })
            .unwrap();
        registry.apply_as("0xUA", &tx).unwrap();
        let listed = registry.list_user_memories("0xUA").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].blob_id, "blob-1");
    }

    #[test]
    fn update_memory_index_rejects_stale_version() {
        let registry = FakeOwnershipRegistry::new();
        let create = registry.build_create_memory_index("blob-a", "graph-a").unwrap();
        registry.apply_as("0xUA", &create).unwrap();

        let stale = registry
            .build_update_memory_index(UpdateMemoryIndexArgs { memory_index: "0xUA", expected_version: 99, new_index_blob_id: "blob-b", new_graph_blob_id: "graph-b" })
            .unwrap();
        let err = registry.apply_as("0xUA", &stale).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn forced_conflicts_exhaust_then_clear() {
        let registry = FakeOwnershipRegistry::new();
        let create = registry.build_create_memory_index("blob-a", "graph-a").unwrap();
        registry.apply_as("0xUA", &create).unwrap();
        registry.force_conflicts("0xUA", 1);

        let update = registry
            .build_update_memory_index(UpdateMemoryIndexArgs { memory_index: "0xUA", expected_version: 1, new_index_blob_id: "blob-b", new_graph_blob_id: "graph-b" })
            .unwrap();
        assert_eq!(registry.apply_as("0xUA", &update).unwrap_err().kind, ErrorKind::Conflict);
        registry.apply_as("0xUA", &update).unwrap();
        assert_eq!(registry.get_memory_index("0xUA").unwrap().unwrap().version, 2);
    }
}
