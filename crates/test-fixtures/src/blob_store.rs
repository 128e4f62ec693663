//! In-memory stand-in for a content-addressed blob store, for crates that
//! only need `IBlobStore` without a real network/local backend.

use dashmap::DashMap;

use pdw_core::errors::PdwResult;
use pdw_core::traits::IBlobStore;

#[derive(Default)]
pub struct FakeBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl IBlobStore for FakeBlobStore {
    fn put(&self, bytes: &[u8], _owner: &str, _retention_epochs: u32, _tags: &[(String, String)]) -> PdwResult<String> {
        let id = blake3::hash(bytes).to_hex().to_string();
        self.blobs.insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    fn get(&self, blob_id: &str) -> PdwResult<Vec<u8>> {
        self.blobs.get(blob_id).map(|entry| entry.value().clone()).ok_or_else(|| pdw_core::errors::PdwError::not_found(format!("no such blob: {blob_id}")))
    }

    fn exists(&self, blob_id: &str) -> PdwResult<bool> {
        Ok(self.blobs.contains_key(blob_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = FakeBlobStore::new();
        let id = store.put(b"hello", "0xUA", 1, &[]).unwrap();
        assert_eq!(store.get(&id).unwrap(), b"hello");
    }

    #[test]
    fn missing_blob_is_not_found() {
        let store = FakeBlobStore::new();
        assert!(store.get("nope").is_err());
    }

    #[test]
    fn identical_content_shares_an_id() {
        let store = FakeBlobStore::new();
        let a = store.put(b"same", "0xUA", 1, &[]).unwrap();
        let b = store.put(b"same", "0xUB", 1, &[]).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }
}
