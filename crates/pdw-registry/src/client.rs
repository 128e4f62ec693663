//! `ChainRegistryClient`: HTTP-backed `IOwnershipRegistry` over a chain
//! indexer/RPC service.

use serde::Deserialize;

use pdw_core::errors::{PdwError, PdwResult};
use pdw_core::model::{AccessGrant, MemoryIndexRoot, MemoryRecord};
use pdw_core::traits::{CreateMemoryRecordArgs, IOwnershipRegistry, UnsignedTx, UpdateMemoryIndexArgs};

use crate::txbuilder;

pub struct ChainRegistryClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ChainRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn get_optional<T: for<'de> Deserialize<'de>>(&self, path: &str) -> PdwResult<Option<T>> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .map_err(|e| PdwError::unavailable(format!("registry unreachable: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PdwError::unavailable(format!("registry returned status {}", response.status())));
        }
        response
            .json()
            .map(Some)
            .map_err(|e| PdwError::internal(format!("malformed registry response: {e}")))
    }
}

impl IOwnershipRegistry for ChainRegistryClient {
    fn build_create_memory_record(&self, args: CreateMemoryRecordArgs<'_>) -> PdwResult<UnsignedTx> {
        txbuilder::build_create_memory_record(args)
    }

    fn build_delete_memory(&self, memory_id: &str) -> PdwResult<UnsignedTx> {
        txbuilder::build_delete_memory(memory_id)
    }

    fn build_update_memory_metadata(&self, memory_id: &str, new_topic: Option<&str>, new_importance: Option<u8>) -> PdwResult<UnsignedTx> {
        txbuilder::build_update_memory_metadata(memory_id, new_topic, new_importance)
    }

    fn build_create_memory_index(&self, index_blob_id: &str, graph_blob_id: &str) -> PdwResult<UnsignedTx> {
        txbuilder::build_create_memory_index(index_blob_id, graph_blob_id)
    }

    fn build_update_memory_index(&self, args: UpdateMemoryIndexArgs<'_>) -> PdwResult<UnsignedTx> {
        txbuilder::build_update_memory_index(args)
    }

    fn get_memory(&self, memory_id: &str) -> PdwResult<Option<MemoryRecord>> {
        self.get_optional(&format!("/memories/{memory_id}"))
    }

    fn get_memory_index(&self, owner: &str) -> PdwResult<Option<MemoryIndexRoot>> {
        self.get_optional(&format!("/memory-index/{owner}"))
    }

    fn list_user_memories(&self, owner: &str) -> PdwResult<Vec<MemoryRecord>> {
        Ok(self.get_optional(&format!("/memories?owner={owner}"))?.unwrap_or_default())
    }

    fn get_access_grant(&self, grant_id: &str) -> PdwResult<Option<AccessGrant>> {
        self.get_optional(&format!("/access-grants/{grant_id}"))
    }
}
