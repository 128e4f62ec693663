//! `RetrievalEngine`: query embedding, ANN search over a read-your-writes
//! snapshot, permission-gated decryption fan-out, and context assembly
//!.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use pdw_batch::BatchCoordinator;
use pdw_core::config::RetrievalConfig;
use pdw_core::errors::PdwResult;
use pdw_core::model::MemoryRecord;
use pdw_core::traits::{EmbeddingKind, IBlobStore, IEmbeddingProvider, IOwnershipRegistry, IVectorIndex};
use pdw_encryption::{build_grant_approval, build_self_approval, EncryptionEngine, SessionKey};

use crate::query::{AssembleContextQuery, AssembledContext, ContextStats, SearchQuery, SearchResult};

pub struct RetrievalEngine {
    config: RetrievalConfig,
    embedding_dimension: usize,
    embedder: Arc<dyn IEmbeddingProvider>,
    registry: Arc<dyn IOwnershipRegistry>,
    batch: Arc<BatchCoordinator>,
    blob_store: Arc<dyn IBlobStore>,
    encryption: EncryptionEngine,
}

impl RetrievalEngine {
    pub fn new(
        config: RetrievalConfig,
        embedding_dimension: usize,
        embedder: Arc<dyn IEmbeddingProvider>,
        registry: Arc<dyn IOwnershipRegistry>,
        batch: Arc<BatchCoordinator>,
        blob_store: Arc<dyn IBlobStore>,
        encryption: EncryptionEngine,
    ) -> Self {
        Self { config, embedding_dimension, embedder, registry, batch, blob_store, encryption }
    }

    /// `vector_id → MemoryRecord` built fresh from the registry's current
    /// listing for `user`. Record creation is a direct chain submit (not
    /// batched through the write journal), so this stays authoritative even
    /// while the vector snapshot lags behind an unflushed journal.
    fn vector_index_map(&self, user: &str) -> PdwResult<HashMap<u64, MemoryRecord>> {
        Ok(self.registry.list_user_memories(user)?.into_iter().map(|record| (record.vector_id, record)).collect())
    }

    /// `search()` plus the `embed`/`search` timings `assemble_context` folds
    /// into its own stats, so the query is only embedded once.
    fn search_timed(&self, query: &SearchQuery) -> PdwResult<(Vec<SearchResult>, u64, u64)> {
        let embed_started = Instant::now();
        let query_vector = self.embedder.embed(&query.query_text, EmbeddingKind::Query)?;
        let embed_ms = embed_started.elapsed().as_millis() as u64;

        let search_started = Instant::now();
        let by_vector_id = self.vector_index_map(&query.user)?;
        let snapshot = self.batch.snapshot_index(&query.user, self.embedding_dimension)?;

        let overfetch_k = query.k.max(self.config.overfetch_factor * query.k);
        let hits = snapshot.search(&query_vector, overfetch_k, None)?;

        let mut results: Vec<SearchResult> = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(record) = by_vector_id.get(&hit.vector_id) else {
                debug!(vector_id = hit.vector_id, "no memory record for this vector id yet, skipping");
                continue;
            };
            if let Some(category) = &query.category {
                if &record.category != category {
                    continue;
                }
            }
            if let Some((start, end)) = query.time_range {
                if record.metadata.created_ts < start || record.metadata.created_ts > end {
                    continue;
                }
            }
            let similarity = 1.0 - hit.distance;
            if let Some(min_similarity) = query.min_similarity {
                if similarity < min_similarity {
                    continue;
                }
            }
            results.push(SearchResult { memory_id: record.memory_id.clone(), similarity, metadata: record.metadata.clone() });
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.metadata.importance.cmp(&a.metadata.importance))
                .then_with(|| a.metadata.created_ts.cmp(&b.metadata.created_ts))
        });
        results.truncate(query.k);
        let search_ms = search_started.elapsed().as_millis() as u64;
        Ok((results, embed_ms, search_ms))
    }

    /// `{query_text, user, k, category?, min_similarity?, time_range?} →
    /// [{memory_id, similarity, metadata}]`.
    pub fn search(&self, query: &SearchQuery) -> PdwResult<Vec<SearchResult>> {
        self.search_timed(query).map(|(results, _, _)| results)
    }

    /// `{query, user, k, requesting_wallet} → {context_string,
    /// memories_used, stats}`: search, then a best-effort
    /// threshold-decrypt fan-out per candidate, dropping whatever
    /// `requesting_wallet` isn't authorized to read.
    pub fn assemble_context(&self, query: &AssembleContextQuery, session: &SessionKey) -> PdwResult<AssembledContext> {
        let (candidates, embed_ms, search_ms) =
            self.search_timed(&SearchQuery::new(query.query_text.clone(), query.user.clone(), query.k))?;
        let found = candidates.len();

        let by_vector_id = self.vector_index_map(&query.user)?;
        let records_by_memory_id: HashMap<&str, &MemoryRecord> = by_vector_id.values().map(|r| (r.memory_id.as_str(), r)).collect();

        let decrypt_started = Instant::now();
        let mut context_string = String::new();
        let mut memories_used = Vec::new();
        let mut allowed = 0usize;

        for candidate in &candidates {
            let Some(record) = records_by_memory_id.get(candidate.memory_id.as_str()) else {
                continue;
            };
            let approval_tx = if query.requesting_wallet == record.owner {
                build_self_approval(&record.owner)?
            } else {
                build_grant_approval(&query.requesting_wallet, &candidate.memory_id)?
            };

            let ciphertext = match self.blob_store.get(&record.blob_id) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(memory_id = %candidate.memory_id, error = %e.message, "blob unavailable, dropping candidate");
                    continue;
                }
            };
            let plaintext = match self.encryption.decrypt(&ciphertext, record.owner.as_bytes(), &approval_tx, session) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(memory_id = %candidate.memory_id, error = %e.message, "requester could not decrypt this memory");
                    continue;
                }
            };
            let Ok(text) = String::from_utf8(plaintext) else {
                debug!(memory_id = %candidate.memory_id, "decrypted content was not valid utf-8, dropping");
                continue;
            };

            if context_string.len() + text.len() > self.config.context_char_budget {
                break;
            }
            if !context_string.is_empty() {
                context_string.push_str("\n\n");
            }
            context_string.push_str(&text);
            memories_used.push(candidate.memory_id.clone());
            allowed += 1;
        }
        let decrypt_ms = decrypt_started.elapsed().as_millis() as u64;

        Ok(AssembledContext {
            context_string,
            memories_used,
            stats: ContextStats { embed_ms, search_ms, decrypt_ms, found, allowed },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};

    use pdw_core::config::{BatchConfig, GraphConfig, RetrievalConfig, VectorIndexConfig};
    use pdw_core::model::{Memory, MemoryMetadata};
    use pdw_core::traits::CreateMemoryRecordArgs;
    use pdw_encryption::{begin_session, finalize_session, IKeyServer, LocalKeyServer, Policy, SessionKey, ThresholdConfig};
    use test_fixtures::{FakeBlobStore, FakeEmbeddingProvider, FakeOwnershipRegistry};

    use super::*;

    const DIM: usize = 8;

    fn encryption_engine(policy: Policy) -> EncryptionEngine {
        let servers: Vec<Box<dyn IKeyServer>> =
            (1..=3).map(|i| Box::new(LocalKeyServer::new(i, Arc::clone(&policy))) as Box<dyn IKeyServer>).collect();
        EncryptionEngine::new(servers, ThresholdConfig { threshold_t: 2, servers_n: 3 }).unwrap()
    }

    fn session_for(user: &str) -> SessionKey {
        let (signing_key, assertion) = begin_session(user, "pkg-1", 60).unwrap();
        finalize_session(signing_key, assertion, vec![1u8; 64])
    }

    struct Fixture {
        registry: Arc<FakeOwnershipRegistry>,
        blob_store: Arc<FakeBlobStore>,
        batch: Arc<BatchCoordinator>,
        encryption: EncryptionEngine,
    }

    impl Fixture {
        fn new(policy: Policy) -> Self {
            let registry = Arc::new(FakeOwnershipRegistry::new());
            let blob_store = Arc::new(FakeBlobStore::new());
            let registry_obj: Arc<dyn IOwnershipRegistry> = registry.clone();
            let blob_store_obj: Arc<dyn IBlobStore> = blob_store.clone();
            let batch = Arc::new(BatchCoordinator::new(
                VectorIndexConfig::default(),
                GraphConfig::default(),
                BatchConfig { max_pending: 100, max_delay_ms: 999_999, max_cas_retries: 3, idle_eviction_secs: 600 },
                blob_store_obj,
                registry_obj,
            ));
            Self { registry, blob_store, batch, encryption: encryption_engine(policy) }
        }

        /// Seeds one memory: encrypts `content` under `owner`'s identity,
        /// puts the ciphertext in the blob store, publishes a memory record
        /// for it, and enqueues `vector` against `vector_id` in the batch
        /// journal. Returns the memory id the fake registry minted.
        fn seed(&self, owner: &str, vector_id: u64, vector: Vec<f32>, content: &str, category: &str, importance: u8, created_ts: Option<DateTime<Utc>>) -> String {
            let mut memory = Memory::new(format!("src-{vector_id}"), owner, content);
            memory.category = category.to_string();
            memory.set_importance(importance);
            let mut metadata = MemoryMetadata::for_memory(&memory, "text/plain");
            if let Some(ts) = created_ts {
                metadata.created_ts = ts;
            }

            let (ciphertext, _backup) = self.encryption.encrypt(content.as_bytes(), owner.as_bytes()).unwrap();
            let blob_id = self.blob_store.put(&ciphertext, owner, 52, &[]).unwrap();

            let tx = self
                .registry
                .build_create_memory_record(CreateMemoryRecordArgs { category, vector_id, blob_id: &blob_id, metadata: &metadata })
                .unwrap();
            self.registry.apply_as(owner, &tx).unwrap();
            self.batch.enqueue(owner, vector_id, vector, None);

            self.registry.list_user_memories(owner).unwrap().into_iter().find(|r| r.blob_id == blob_id).unwrap().memory_id
        }
    }

    // `EncryptionEngine` has no `Clone`; a test that needs both a `Fixture`
    // (to seed ciphertexts) and a `RetrievalEngine` (to decrypt them) builds
    // two engines from the same policy rather than sharing one instance.
    fn with_engine(policy: Policy) -> (Fixture, Arc<FakeEmbeddingProvider>, RetrievalEngine) {
        with_engine_and_config(policy, RetrievalConfig::default())
    }

    fn with_engine_and_config(policy: Policy, config: RetrievalConfig) -> (Fixture, Arc<FakeEmbeddingProvider>, RetrievalEngine) {
        let fixture = Fixture::new(policy.clone());
        let embedder = Arc::new(FakeEmbeddingProvider::new(DIM));
        let embedder_for_engine: Arc<dyn IEmbeddingProvider> = embedder.clone();
        let registry_obj: Arc<dyn IOwnershipRegistry> = fixture.registry.clone();
        let blob_store_obj: Arc<dyn IBlobStore> = fixture.blob_store.clone();
        let engine = RetrievalEngine::new(
            config,
            DIM,
            embedder_for_engine,
            registry_obj,
            fixture.batch.clone(),
            blob_store_obj,
            encryption_engine(policy),
        );
        (fixture, embedder, engine)
    }

    #[test]
    fn search_ranks_by_similarity_and_respects_category_filter() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::allow_all_policy());
        let query_vector = embedder.embed("find my cat", EmbeddingKind::Query).unwrap();
        let far_vector = embedder.embed("completely unrelated topic", EmbeddingKind::Document).unwrap();

        let near_id = fixture.seed("0xUA", 0, query_vector.clone(), "near content", "general", 5, None);
        let far_id = fixture.seed("0xUA", 1, far_vector, "far content", "general", 5, None);
        let _wrong_category = fixture.seed("0xUA", 2, query_vector, "excluded by category", "archive", 5, None);

        let mut query = SearchQuery::new("find my cat", "0xUA", 5);
        query.category = Some("general".to_string());
        let results = engine.search(&query).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].memory_id, near_id);
        assert_eq!(results[1].memory_id, far_id);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn search_truncates_to_k() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::allow_all_policy());
        let query_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        for i in 0..5u64 {
            fixture.seed("0xUA", i, query_vector.clone(), "content", "general", 5, None);
        }

        let results = engine.search(&SearchQuery::new("q", "0xUA", 2)).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn equal_similarity_breaks_ties_by_importance_then_age() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::allow_all_policy());
        let query_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        let now = Utc::now();

        let low_importance = fixture.seed("0xUA", 0, query_vector.clone(), "a", "general", 3, Some(now));
        let high_importance = fixture.seed("0xUA", 1, query_vector.clone(), "b", "general", 9, Some(now));
        let same_importance_older = fixture.seed("0xUA", 2, query_vector.clone(), "c", "general", 9, Some(now - Duration::minutes(10)));

        let results = engine.search(&SearchQuery::new("q", "0xUA", 3)).unwrap();
        assert_eq!(results[0].memory_id, same_importance_older, "older wins among equal importance");
        assert_eq!(results[1].memory_id, high_importance);
        assert_eq!(results[2].memory_id, low_importance);
    }

    #[test]
    fn min_similarity_drops_distant_candidates() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::allow_all_policy());
        let query_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        let far_vector = embedder.embed("something else entirely", EmbeddingKind::Document).unwrap();
        fixture.seed("0xUA", 0, query_vector, "near", "general", 5, None);
        fixture.seed("0xUA", 1, far_vector, "far", "general", 5, None);

        let mut query = SearchQuery::new("q", "0xUA", 5);
        query.min_similarity = Some(0.99);
        let results = engine.search(&query).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn time_range_filters_by_created_ts() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::allow_all_policy());
        let query_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        let now = Utc::now();
        let in_range = fixture.seed("0xUA", 0, query_vector.clone(), "a", "general", 5, Some(now));
        fixture.seed("0xUA", 1, query_vector, "b", "general", 5, Some(now - Duration::days(30)));

        let mut query = SearchQuery::new("q", "0xUA", 5);
        query.time_range = Some((now - Duration::hours(1), now + Duration::hours(1)));
        let results = engine.search(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory_id, in_range);
    }

    #[test]
    fn assemble_context_concatenates_decrypted_content_for_the_owner() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::self_approval_policy("0xUA"));
        let near_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        let far_vector = embedder.embed("something else entirely", EmbeddingKind::Document).unwrap();
        fixture.seed("0xUA", 0, near_vector, "alpha content", "general", 5, None);
        fixture.seed("0xUA", 1, far_vector, "beta content", "general", 5, None);

        let session = session_for("0xUA");
        let query = AssembleContextQuery { query_text: "q".to_string(), user: "0xUA".to_string(), k: 5, requesting_wallet: "0xUA".to_string() };
        let assembled = engine.assemble_context(&query, &session).unwrap();

        assert_eq!(assembled.stats.found, 2);
        assert_eq!(assembled.stats.allowed, 2);
        assert_eq!(assembled.memories_used.len(), 2);
        assert!(assembled.context_string.starts_with("alpha content"));
        assert!(assembled.context_string.contains("beta content"));
    }

    #[test]
    fn assemble_context_drops_memories_the_requester_cannot_decrypt() {
        let (fixture, embedder, engine) = with_engine(LocalKeyServer::self_approval_policy("0xUA"));
        let vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        fixture.seed("0xUA", 0, vector, "owner-only secret", "general", 5, None);

        let session = session_for("0xATTACKER");
        let query =
            AssembleContextQuery { query_text: "q".to_string(), user: "0xUA".to_string(), k: 5, requesting_wallet: "0xATTACKER".to_string() };
        let assembled = engine.assemble_context(&query, &session).unwrap();

        assert_eq!(assembled.stats.found, 1);
        assert_eq!(assembled.stats.allowed, 0);
        assert!(assembled.memories_used.is_empty());
        assert!(assembled.context_string.is_empty());
        assert!(!assembled.context_string.contains("secret"), "plaintext must never leak for a denied candidate");
    }

    #[test]
    fn assemble_context_clips_to_the_configured_budget() {
        let config = RetrievalConfig { overfetch_factor: 4, context_char_budget: "alpha content".len() };
        let (fixture, embedder, engine) = with_engine_and_config(LocalKeyServer::allow_all_policy(), config);
        let near_vector = embedder.embed("q", EmbeddingKind::Query).unwrap();
        let far_vector = embedder.embed("something else entirely", EmbeddingKind::Document).unwrap();
        let first_id = fixture.seed("0xUA", 0, near_vector, "alpha content", "general", 5, None);
        fixture.seed("0xUA", 1, far_vector, "beta content that will not fit in the budget", "general", 5, None);

        let session = session_for("0xUA");
        let query = AssembleContextQuery { query_text: "q".to_string(), user: "0xUA".to_string(), k: 5, requesting_wallet: "0xUA".to_string() };
        let assembled = engine.assemble_context(&query, &session).unwrap();

        assert_eq!(assembled.memories_used, vec![first_id]);
        assert_eq!(assembled.context_string, "alpha content");
    }
}
