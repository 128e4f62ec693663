use crate::errors::PdwResult;

/// Content-addressed blob store. `put` returns the
/// content-addressed id; local-fallback ids are prefixed `local_` so the
/// read path can route correctly without a side channel.
pub trait IBlobStore: Send + Sync {
    fn put(&self, bytes: &[u8], owner: &str, retention_epochs: u32, tags: &[(String, String)]) -> PdwResult<String>;
    fn get(&self, blob_id: &str) -> PdwResult<Vec<u8>>;
    fn exists(&self, blob_id: &str) -> PdwResult<bool>;
}
