//! Content-addressed blob store client (C6): `put`/`get`/`exists` over a
//! decentralized store, with an explicit local-filesystem backend and a
//! small-content read cache fronting both.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use moka::sync::Cache;
use tracing::warn;

use pdw_core::config::{StorageConfig, StorageNetwork};
use pdw_core::errors::{PdwError, PdwResult};
use pdw_core::traits::IBlobStore;

const LOCAL_PREFIX: &str = "local_";
/// Only content this small and utf-8-decodable is worth caching; binary
/// blobs (vectors, ciphertext) are never cached.
const MAX_CACHEABLE_BYTES: usize = 8192;

fn content_id(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

struct RemoteBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RemoteBackend {
    fn put(&self, id: &str, bytes: &[u8], owner: &str, retention_epochs: u32, tags: &[(String, String)]) -> PdwResult<()> {
        let tag_headers: Vec<(String, String)> = tags.to_vec();
        let mut request = self
            .client
            .put(format!("{}/blobs/{id}", self.base_url))
            .header("x-blob-owner", owner)
            .header("x-blob-retention-epochs", retention_epochs.to_string())
            .body(bytes.to_vec());
        for (k, v) in &tag_headers {
            request = request.header(format!("x-blob-tag-{k}"), v.clone());
        }
        let response = request
            .send()
            .map_err(|e| PdwError::unavailable(format!("blob store unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(PdwError::unavailable(format!("blob store put returned status {}", response.status())));
        }
        Ok(())
    }

    fn get(&self, id: &str) -> PdwResult<Vec<u8>> {
        let response = self
            .client
            .get(format!("{}/blobs/{id}", self.base_url))
            .send()
            .map_err(|e| PdwError::unavailable(format!("blob store unreachable: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PdwError::not_found(format!("blob {id} not found")));
        }
        if !response.status().is_success() {
            return Err(PdwError::unavailable(format!("blob store get returned status {}", response.status())));
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| PdwError::unavailable(format!("blob store body read failed: {e}")))
    }

    fn exists(&self, id: &str) -> PdwResult<bool> {
        let response = self
            .client
            .head(format!("{}/blobs/{id}", self.base_url))
            .send()
            .map_err(|e| PdwError::unavailable(format!("blob store unreachable: {e}")))?;
        Ok(response.status().is_success())
    }
}

struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    fn put(&self, id: &str, bytes: &[u8]) -> PdwResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| PdwError::internal(format!("local blob dir create failed: {e}")))?;
        fs::write(self.path_for(id), bytes).map_err(|e| PdwError::internal(format!("local blob write failed: {e}")))
    }

    fn get(&self, id: &str) -> PdwResult<Vec<u8>> {
        fs::read(self.path_for(id)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PdwError::not_found(format!("local blob {id} not found")),
            _ => PdwError::internal(format!("local blob read failed: {e}")),
        })
    }

    fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }
}

/// Content-addressed blob store. When `network` is not [`StorageNetwork::Local`],
/// writes attempt the remote backend first and fall back to the local
/// filesystem on `Unavailable`, marking the resulting id with [`LOCAL_PREFIX`]
/// so later reads route back to the local backend without a side channel.
pub struct BlobStore {
    remote: Option<RemoteBackend>,
    local: LocalBackend,
    cache: Cache<String, String>,
}

impl BlobStore {
    /// Opens a store per `config.network`. `Local` must be chosen
    /// explicitly — there is no silent default to filesystem-only mode.
    pub fn open(config: &StorageConfig, base_url: impl Into<String>, local_dir: PathBuf) -> Self {
        let remote = match config.network {
            StorageNetwork::Local => None,
            StorageNetwork::Testnet | StorageNetwork::Mainnet => Some(RemoteBackend {
                client: reqwest::blocking::Client::new(),
                base_url: base_url.into(),
            }),
        };
        let cache = Cache::builder()
            .max_capacity(config.cache_max_entries)
            .time_to_live(Duration::from_secs(config.cache_ttl_s))
            .build();
        Self {
            remote,
            local: LocalBackend { dir: local_dir },
            cache,
        }
    }

    fn maybe_cache(&self, blob_id: &str, bytes: &[u8]) {
        if bytes.len() > MAX_CACHEABLE_BYTES {
            return;
        }
        if let Ok(text) = std::str::from_utf8(bytes) {
            self.cache.insert(blob_id.to_string(), text.to_string());
        }
    }
}

impl IBlobStore for BlobStore {
    fn put(&self, bytes: &[u8], owner: &str, retention_epochs: u32, tags: &[(String, String)]) -> PdwResult<String> {
        let id = content_id(bytes);
        let final_id = match &self.remote {
            Some(remote) => match remote.put(&id, bytes, owner, retention_epochs, tags) {
                Ok(()) => id,
                Err(e) => {
                    warn!(error = %e, "blob store remote put failed, falling back to local filesystem");
                    let local_id = format!("{LOCAL_PREFIX}{id}");
                    self.local.put(&local_id, bytes)?;
                    local_id
                }
            },
            None => {
                let local_id = format!("{LOCAL_PREFIX}{id}");
                self.local.put(&local_id, bytes)?;
                local_id
            }
        };
        self.maybe_cache(&final_id, bytes);
        Ok(final_id)
    }

    fn get(&self, blob_id: &str) -> PdwResult<Vec<u8>> {
        if let Some(cached) = self.cache.get(blob_id) {
            return Ok(cached.into_bytes());
        }
        let bytes = if let Some(rest) = blob_id.strip_prefix(LOCAL_PREFIX) {
            self.local.get(&format!("{LOCAL_PREFIX}{rest}"))?
        } else {
            match &self.remote {
                Some(remote) => remote.get(blob_id)?,
                None => self.local.get(blob_id)?,
            }
        };
        self.maybe_cache(blob_id, &bytes);
        Ok(bytes)
    }

    fn exists(&self, blob_id: &str) -> PdwResult<bool> {
        if self.cache.get(blob_id).is_some() {
            return Ok(true);
        }
        if let Some(rest) = blob_id.strip_prefix(LOCAL_PREFIX) {
            return Ok(self.local.exists(&format!("{LOCAL_PREFIX}{rest}")));
        }
        match &self.remote {
            Some(remote) => remote.exists(blob_id),
            None => Ok(self.local.exists(blob_id)),
        }
    }
}
