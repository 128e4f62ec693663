//! `BatchCoordinator`: per-user write lock, debounced flush, and bounded
//! CAS retry against the ownership registry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tracing::{info, warn};

use pdw_core::config::{BatchConfig, GraphConfig, VectorIndexConfig};
use pdw_core::errors::{ErrorKind, PdwError, PdwResult};
use pdw_core::model::MemoryIndexRoot;
use pdw_core::traits::{
    IBlobStore, IKnowledgeGraphStore, IOwnershipRegistry, IVectorIndex, UpdateMemoryIndexArgs,
};
use pdw_graph::PerUserGraphStore;
use pdw_vector_index::HnswIndex;

use crate::journal::{GraphDelta, PendingOp, UserJournal};

/// Submits a built transaction on the caller's behalf (signing and
/// broadcast are external collaborators this crate never performs), and
/// reports whether the on-chain CAS predicate accepted it.
pub trait ITxSubmitter: Send + Sync {
    fn submit(&self, tx: pdw_core::traits::UnsignedTx) -> PdwResult<()>;
}

const DEFAULT_RETENTION_EPOCHS: u32 = 52;

pub struct BatchCoordinator {
    vector_config: VectorIndexConfig,
    graph_config: GraphConfig,
    batch_config: BatchConfig,
    blob_store: Arc<dyn IBlobStore>,
    registry: Arc<dyn IOwnershipRegistry>,
    journals: DashMap<String, Arc<Mutex<UserJournal>>>,
}

impl BatchCoordinator {
    pub fn new(vector_config: VectorIndexConfig, graph_config: GraphConfig, batch_config: BatchConfig, blob_store: Arc<dyn IBlobStore>, registry: Arc<dyn IOwnershipRegistry>) -> Self {
        Self {
            vector_config,
            graph_config,
            batch_config,
            blob_store,
            registry,
            journals: DashMap::new(),
        }
    }

    fn journal_for(&self, user: &str) -> Arc<Mutex<UserJournal>> {
        self.journals.entry(user.to_string()).or_insert_with(|| Arc::new(Mutex::new(UserJournal::new()))).clone()
    }

    /// Appends a vector insertion (and optional graph delta) to `user`'s
    /// journal, returning whether the debounce threshold was crossed.
    pub fn enqueue(&self, user: &str, vector_id: u64, vector: Vec<f32>, graph_delta: Option<GraphDelta>) -> bool {
        let journal = self.journal_for(user);
        let mut guard = journal.lock().unwrap();
        guard.push(PendingOp::Insert { vector_id, vector, graph_delta });
        guard.should_flush(self.batch_config.max_pending, self.batch_config.max_delay_ms)
    }

    pub fn enqueue_tombstone(&self, user: &str, vector_id: u64) -> bool {
        let journal = self.journal_for(user);
        let mut guard = journal.lock().unwrap();
        guard.push(PendingOp::Tombstone { vector_id });
        guard.should_flush(self.batch_config.max_pending, self.batch_config.max_delay_ms)
    }

    /// Hands out the next strictly sequential vector id for `user`,
    /// seeding from the last persisted snapshot on first use and holding
    /// strictly across flushes.
    pub fn allocate_vector_id(&self, user: &str) -> PdwResult<u64> {
        let journal = self.journal_for(user);
        let mut guard = journal.lock().unwrap();
        if guard.next_vector_id.is_none() {
            let seed = match self.registry.get_memory_index(user)? {
                Some(root) => {
                    let index_bytes = self.blob_store.get(&root.index_blob_id)?;
                    HnswIndex::deserialize_trusted(&index_bytes)?.peek_next_vector_id()
                }
                None => 0,
            };
            guard.next_vector_id = Some(seed);
        }
        let id = guard.next_vector_id.expect("seeded above");
        guard.next_vector_id = Some(id + 1);
        Ok(id)
    }

    /// Read-your-writes: pending inserts for `user` not yet flushed,
    /// consulted before falling back to the last persisted snapshot
    ///.
    pub fn pending_vectors(&self, user: &str) -> Vec<(u64, Vec<f32>)> {
        let journal = self.journal_for(user);
        let guard = journal.lock().unwrap();
        guard.pending_vectors().into_iter().map(|(id, v)| (id, v.to_vec())).collect()
    }

    /// A read-only, as-of-now view of `user`'s vector index: the last
    /// persisted snapshot with every pending (unflushed) insert/tombstone
    /// replayed on top, in enqueue order. Never persists anything and never
    /// takes the flush path's CAS lock — reads don't need the writer mutex
    ///.
    pub fn snapshot_index(&self, user: &str, fallback_dimension: usize) -> PdwResult<HnswIndex> {
        let root = self.registry.get_memory_index(user)?;
        let (mut index, _graph) = self.load_index_and_graph(user, &root, fallback_dimension)?;

        let journal = self.journal_for(user);
        let pending: Vec<PendingOp> = journal.lock().unwrap().pending.iter().cloned().collect();
        for op in pending {
            match op {
                PendingOp::Insert { vector_id, vector, .. } => index.add(vector_id, &vector)?,
                PendingOp::Tombstone { vector_id } => index.mark_delete(vector_id),
            }
        }
        index.build()?;
        Ok(index)
    }

    /// Evicts journals idle past `batch_config.idle_eviction_secs` with
    /// nothing pending — the per-user state itself, not unflushed work.
    pub fn evict_idle(&self) {
        let idle_bound = Duration::from_secs(self.batch_config.idle_eviction_secs);
        self.journals.retain(|_, journal| {
            let guard = journal.lock().unwrap();
            !(guard.is_empty() && guard.last_activity.elapsed() >= idle_bound)
        });
    }

    fn load_index_and_graph(&self, user: &str, root: &Option<MemoryIndexRoot>, fallback_dimension: usize) -> PdwResult<(HnswIndex, PerUserGraphStore)> {
        match root {
            Some(root) => {
                let _ = fallback_dimension;
                let index_bytes = self.blob_store.get(&root.index_blob_id)?;
                let graph_bytes = self.blob_store.get(&root.graph_blob_id)?;
                let index = HnswIndex::deserialize_trusted(&index_bytes)?;
                let graph = PerUserGraphStore::deserialize(&graph_bytes)?;
                Ok((index, graph))
            }
            None => {
                info!(user, "no existing memory index root, starting from an empty snapshot");
                Ok((
                    HnswIndex::new(fallback_dimension, &self.vector_config),
                    PerUserGraphStore::new(self.graph_config.confidence_threshold),
                ))
            }
        }
    }

    /// Loads the current snapshot, applies every pending mutation in
    /// enqueue order, persists the new blobs, and submits the CAS
    /// transaction — retrying reload-and-replay up to
    /// `batch_config.max_cas_retries` times on conflict.
    pub fn flush_user(&self, user: &str, submitter: &dyn ITxSubmitter) -> PdwResult<()> {
        let journal = self.journal_for(user);
        let mut guard = journal.lock().unwrap();
        if guard.is_empty() {
            return Ok(());
        }

        let fallback_dimension = guard
            .pending
            .iter()
            .find_map(|op| match op {
                PendingOp::Insert { vector, .. } => Some(vector.len()),
                PendingOp::Tombstone { .. } => None,
            })
            .unwrap_or(self.vector_config.max_elements.min(768).max(1));

        let attempts = self.batch_config.max_cas_retries + 1;
        for attempt in 0..attempts {
            let root = self.registry.get_memory_index(user)?;
            let (mut index, mut graph) = self.load_index_and_graph(user, &root, fallback_dimension)?;

            for op in &guard.pending {
                match op {
                    PendingOp::Insert { vector_id, vector, graph_delta } => {
                        index.add(*vector_id, vector)?;
                        if let Some(delta) = graph_delta {
                            graph.upsert_entities(delta.entities.clone())?;
                            graph.upsert_relationships(delta.relationships.clone())?;
                        }
                    }
                    PendingOp::Tombstone { vector_id } => index.mark_delete(*vector_id),
                }
            }
            index.build()?;

            let new_index_bytes = index.serialize()?;
            let new_graph_bytes = graph.serialize()?;
            let new_index_blob_id = self.blob_store.put(&new_index_bytes, user, DEFAULT_RETENTION_EPOCHS, &[])?;
            let new_graph_blob_id = self.blob_store.put(&new_graph_bytes, user, DEFAULT_RETENTION_EPOCHS, &[])?;

            let tx = match &root {
                Some(root) => self.registry.build_update_memory_index(UpdateMemoryIndexArgs {
                    memory_index: &root.owner,
                    expected_version: root.version,
                    new_index_blob_id: &new_index_blob_id,
                    new_graph_blob_id: &new_graph_blob_id,
                })?,
                None => self.registry.build_create_memory_index(&new_index_blob_id, &new_graph_blob_id)?,
            };

            match submitter.submit(tx) {
                Ok(()) => {
                    guard.reset_after_flush();
                    return Ok(());
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    warn!(user, attempt, "memory index CAS rejected, reloading and replaying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(PdwError::conflict(format!("exhausted {} CAS retries for user {user}, journal preserved", self.batch_config.max_cas_retries)))
    }
}
