use crate::errors::PdwResult;

/// A single ANN search result: vector id plus cosine distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub vector_id: u64,
    pub distance: f32,
}

/// Per-user approximate-nearest-neighbor index.
pub trait IVectorIndex: Send + Sync {
    fn add(&mut self, vector_id: u64, vector: &[f32]) -> PdwResult<()>;
    fn search(&self, query: &[f32], k: usize, ef_search: Option<usize>) -> PdwResult<Vec<SearchHit>>;
    fn mark_delete(&mut self, vector_id: u64);
    fn size(&self) -> usize;
    fn serialize(&self) -> PdwResult<Vec<u8>>;
}
