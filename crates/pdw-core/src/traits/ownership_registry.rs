use crate::errors::PdwResult;
use crate::model::{AccessGrant, MemoryIndexRoot, MemoryMetadata, MemoryRecord};

/// Opaque, unsigned transaction bytes returned by a builder.
/// Signing is the caller's responsibility — this crate never signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx(pub Vec<u8>);

/// Inputs to `build_create_memory_record`.
pub struct CreateMemoryRecordArgs<'a> {
    pub category: &'a str,
    pub vector_id: u64,
    pub blob_id: &'a str,
    pub metadata: &'a MemoryMetadata,
}

/// Inputs to `build_update_memory_index`. The on-chain
/// predicate rejects the call unless `expected_version == current_version`.
pub struct UpdateMemoryIndexArgs<'a> {
    pub memory_index: &'a str,
    pub expected_version: u64,
    pub new_index_blob_id: &'a str,
    pub new_graph_blob_id: &'a str,
}

/// Typed transaction builders + reads against the on-chain ownership
/// registry.
pub trait IOwnershipRegistry: Send + Sync {
    fn build_create_memory_record(&self, args: CreateMemoryRecordArgs<'_>) -> PdwResult<UnsignedTx>;
    fn build_delete_memory(&self, memory_id: &str) -> PdwResult<UnsignedTx>;
    fn build_update_memory_metadata(&self, memory_id: &str, new_topic: Option<&str>, new_importance: Option<u8>) -> PdwResult<UnsignedTx>;
    fn build_create_memory_index(&self, index_blob_id: &str, graph_blob_id: &str) -> PdwResult<UnsignedTx>;
    fn build_update_memory_index(&self, args: UpdateMemoryIndexArgs<'_>) -> PdwResult<UnsignedTx>;

    fn get_memory(&self, memory_id: &str) -> PdwResult<Option<MemoryRecord>>;
    fn get_memory_index(&self, owner: &str) -> PdwResult<Option<MemoryIndexRoot>>;
    fn list_user_memories(&self, owner: &str) -> PdwResult<Vec<MemoryRecord>>;
    fn get_access_grant(&self, grant_id: &str) -> PdwResult<Option<AccessGrant>>;
}
