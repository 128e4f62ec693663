//! Deterministic, offline stand-in for `IEmbeddingProvider` — no network
//! call, same text always yields the same vector.

use pdw_core::errors::{PdwError, PdwResult};
use pdw_core::traits::{EmbeddingKind, IEmbeddingProvider};

pub struct FakeEmbeddingProvider {
    dimension: usize,
}

impl FakeEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hashes `text` into a unit-length vector of the provider's dimension.
    /// `kind` perturbs the hash so document and query embeddings of the
    /// same text differ, mirroring providers with distinct pooling modes.
    fn hash_embed(&self, text: &str, kind: EmbeddingKind) -> Vec<f32> {
        let tag = match kind {
            EmbeddingKind::Document => 0u8,
            EmbeddingKind::Query => 1u8,
        };
        let mut out = vec![0.0f32; self.dimension];
        let mut state = blake3::Hasher::new();
        state.update(&[tag]);
        state.update(text.as_bytes());
        let mut reader = state.finalize_xof();
        let mut buf = [0u8; 4];
        for slot in out.iter_mut() {
            reader.fill(&mut buf);
            *slot = (u32::from_le_bytes(buf) as f64 / u32::MAX as f64) as f32 - 0.5;
        }
        let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for slot in out.iter_mut() {
                *slot /= norm;
            }
        }
        out
    }
}

impl IEmbeddingProvider for FakeEmbeddingProvider {
    fn embed(&self, text: &str, kind: EmbeddingKind) -> PdwResult<Vec<f32>> {
        if text.is_empty() {
            return Err(PdwError::invalid_input("cannot embed empty text"));
        }
        Ok(self.hash_embed(text, kind))
    }

    fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> PdwResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t, kind)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_yields_the_same_vector() {
        let provider = FakeEmbeddingProvider::new(16);
        let a = provider.embed("zephyr is a cat", EmbeddingKind::Document).unwrap();
        let b = provider.embed("zephyr is a cat", EmbeddingKind::Document).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn document_and_query_embeddings_of_the_same_text_differ() {
        let provider = FakeEmbeddingProvider::new(16);
        let doc = provider.embed("zephyr is a cat", EmbeddingKind::Document).unwrap();
        let query = provider.embed("zephyr is a cat", EmbeddingKind::Query).unwrap();
        assert_ne!(doc, query);
    }

    #[test]
    fn empty_text_is_rejected() {
        let provider = FakeEmbeddingProvider::new(16);
        assert!(provider.embed("", EmbeddingKind::Document).is_err());
    }

    #[test]
    fn vectors_have_the_declared_dimension() {
        let provider = FakeEmbeddingProvider::new(8);
        assert_eq!(provider.embed("hi", EmbeddingKind::Document).unwrap().len(), 8);
        assert_eq!(provider.dimension(), 8);
    }
}
