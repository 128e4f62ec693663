//! Per-user HNSW approximate-nearest-neighbor index (C3): cosine space,
//! soft-delete tombstones, and a binary snapshot format.

mod index;

pub use index::HnswIndex;
