//! Trait seams shared across crates. Each subsystem crate provides a
//! concrete implementation; `pdw-pipeline`, `pdw-batch`, and `pdw-retrieval`
//! depend only on these traits so they can be exercised against fakes in
//! tests without pulling in the real HTTP/crypto/storage stacks.

mod blob_store;
mod embedding_provider;
mod knowledge_graph_store;
mod ownership_registry;
mod vector_index;

pub use blob_store::IBlobStore;
pub use embedding_provider::{EmbeddingKind, IEmbeddingProvider};
pub use knowledge_graph_store::IKnowledgeGraphStore;
pub use ownership_registry::{CreateMemoryRecordArgs, IOwnershipRegistry, UnsignedTx, UpdateMemoryIndexArgs};
pub use vector_index::{IVectorIndex, SearchHit};
