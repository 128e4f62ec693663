use crate::errors::PdwResult;

/// Whether text is being embedded as a document (ingest) or a query
/// (retrieval). Some providers use different instructions/pooling for the
/// two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    Document,
    Query,
}

/// Turns text into a fixed-dimension vector via an external model API
///.
pub trait IEmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str, kind: EmbeddingKind) -> PdwResult<Vec<f32>>;
    fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> PdwResult<Vec<Vec<f32>>>;
    fn dimension(&self) -> usize;
}
