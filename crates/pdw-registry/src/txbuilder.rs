//! Typed, unsigned transaction builders against the ownership registry
//!. Like `pdw-encryption`'s approval builders, these never
//! sign — signing is the caller's responsibility.

use serde::{Deserialize, Serialize};

use pdw_core::errors::PdwError;
use pdw_core::errors::PdwResult;
use pdw_core::model::MemoryMetadata;
use pdw_core::traits::{CreateMemoryRecordArgs, UnsignedTx, UpdateMemoryIndexArgs};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum ChainCall {
    CreateMemoryRecord {
        category: String,
        vector_id: u64,
        blob_id: String,
        metadata: MemoryMetadata,
    },
    DeleteMemory {
        memory_id: String,
    },
    UpdateMemoryMetadata {
        memory_id: String,
        new_topic: Option<String>,
        new_importance: Option<u8>,
    },
    CreateMemoryIndex {
        index_blob_id: String,
        graph_blob_id: String,
    },
    UpdateMemoryIndex {
        memory_index: String,
        expected_version: u64,
        new_index_blob_id: String,
        new_graph_blob_id: String,
    },
}

fn encode(call: ChainCall) -> PdwResult<UnsignedTx> {
    bincode::serialize(&call).map(UnsignedTx).map_err(|e| PdwError::internal(format!("transaction encode failed: {e}")))
}

pub(crate) fn build_create_memory_record(args: CreateMemoryRecordArgs<'_>) -> PdwResult<UnsignedTx> {
    encode(ChainCall::CreateMemoryRecord {
        category: args.category.to_string(),
        vector_id: args.vector_id,
        blob_id: args.blob_id.to_string(),
        metadata: args.metadata.clone(),
    })
}

pub(crate) fn build_delete_memory(memory_id: &str) -> PdwResult<UnsignedTx> {
    encode(ChainCall::DeleteMemory { memory_id: memory_id.to_string() })
}

pub(crate) fn build_update_memory_metadata(memory_id: &str, new_topic: Option<&str>, new_importance: Option<u8>) -> PdwResult<UnsignedTx> {
    encode(ChainCall::UpdateMemoryMetadata {
        memory_id: memory_id.to_string(),
        new_topic: new_topic.map(str::to_string),
        new_importance,
    })
}

pub(crate) fn build_create_memory_index(index_blob_id: &str, graph_blob_id: &str) -> PdwResult<UnsignedTx> {
    encode(ChainCall::CreateMemoryIndex {
        index_blob_id: index_blob_id.to_string(),
        graph_blob_id: graph_blob_id.to_string(),
    })
}

pub(crate) fn build_update_memory_index(args: UpdateMemoryIndexArgs<'_>) -> PdwResult<UnsignedTx> {
    encode(ChainCall::UpdateMemoryIndex {
        memory_index: args.memory_index.to_string(),
        expected_version: args.expected_version,
        new_index_blob_id: args.new_index_blob_id.to_string(),
        new_graph_blob_id: args.new_graph_blob_id.to_string(),
    })
}
