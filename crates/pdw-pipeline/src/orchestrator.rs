//! PipelineOrchestrator — runs the deterministic per-memory ingest step
//! list, handles partial failure per config, and drives batch mode over a
//! rayon-backed, concurrency-capped pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rayon::prelude::*;
use tracing::{info, warn};

use pdw_batch::{BatchCoordinator, GraphDelta, ITxSubmitter};
use pdw_classifier::ContentClassifier;
use pdw_core::config::{GraphConfig, PipelineConfig};
use pdw_core::errors::PdwResult;
use pdw_core::model::{Memory, MemoryMetadata};
use pdw_core::traits::{CreateMemoryRecordArgs, EmbeddingKind, IBlobStore, IEmbeddingProvider, IOwnershipRegistry};
use pdw_encryption::EncryptionEngine;

use crate::execution::{ExecutionRecord, PipelineStep, StepExecution, StepStatus};
use crate::extraction::IGraphExtractor;

const DEFAULT_RETENTION_EPOCHS: u32 = 52;

pub struct PipelineOrchestrator {
    config: PipelineConfig,
    graph_config: GraphConfig,
    classifier: ContentClassifier,
    embedder: Arc<dyn IEmbeddingProvider>,
    extractor: Option<Box<dyn IGraphExtractor>>,
    /// `None` runs in the documented dev mode that bypasses encryption
    /// entirely. Plaintext then
    /// goes straight to the blob store — never do this against a real
    /// network.
    encryption: Option<EncryptionEngine>,
    blob_store: Arc<dyn IBlobStore>,
    registry: Arc<dyn IOwnershipRegistry>,
    batch: Arc<BatchCoordinator>,
}

impl PipelineOrchestrator {
    pub fn new(
        config: PipelineConfig,
        graph_config: GraphConfig,
        classifier: ContentClassifier,
        embedder: Arc<dyn IEmbeddingProvider>,
        extractor: Option<Box<dyn IGraphExtractor>>,
        encryption: Option<EncryptionEngine>,
        blob_store: Arc<dyn IBlobStore>,
        registry: Arc<dyn IOwnershipRegistry>,
        batch: Arc<BatchCoordinator>,
    ) -> Self {
        Self { config, graph_config, classifier, embedder, extractor, encryption, blob_store, registry, batch }
    }

    /// Retries an idempotent step (embed, blob put by content address) up
    /// to `pipeline.max_retry_attempts` times, never retrying a terminal
    /// error.
    fn with_retries<T>(&self, mut f: impl FnMut() -> PdwResult<T>) -> Result<T, String> {
        let mut attempt = 0;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.kind.is_terminal() => return Err(e.message),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.max_retry_attempts {
                        return Err(e.message);
                    }
                    std::thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
        }
    }

    /// Runs the full step list for one memory, returning a step-by-step
    /// execution record. Never panics on a step failure — the record
    /// captures it instead.
    pub fn ingest(&self, memory: Memory, submitter: &dyn ITxSubmitter) -> ExecutionRecord {
        let memory_id = memory.id.clone();
        let mut steps = Vec::new();
        let mut memory = memory;

        let classification = self.classifier.classify(&memory.content);
        steps.push(StepExecution::success(PipelineStep::Classify));
        if let Some(category) = classification.categories.first() {
            memory.category = category.clone();
        }
        if memory.topic.is_none() {
            memory.topic = classification.topics.first().cloned();
        }
        memory.set_importance(classification.importance);

        let (vector, embed_step) = StepExecution::record(PipelineStep::Embed, || {
            self.with_retries(|| self.embedder.embed(&memory.content, EmbeddingKind::Document))
        });
        steps.push(embed_step);
        let Some(vector) = vector else {
            return self.finish(memory_id, steps, None, false);
        };

        let vector_id = match self.batch.allocate_vector_id(&memory.owner) {
            Ok(id) => id,
            Err(e) => {
                steps.push(StepExecution::failed(PipelineStep::VectorIndexEnqueue, e.message));
                return self.finish(memory_id, steps, None, false);
            }
        };

        let graph_delta = self.run_graph_update(&memory, &mut steps);

        let (enqueue_result, enqueue_step) = StepExecution::record(PipelineStep::VectorIndexEnqueue, || -> Result<bool, String> {
            Ok(self.batch.enqueue(&memory.owner, vector_id, vector.clone(), graph_delta))
        });
        steps.push(enqueue_step);
        let crossed_debounce = enqueue_result.unwrap_or(false);
        if crossed_debounce {
            if let Err(e) = self.batch.flush_user(&memory.owner, submitter) {
                warn!(owner = %memory.owner, error = %e.message, "debounced flush failed, journal preserved for next trigger");
            }
        }

        // Everything past this point has already mutated the per-user
        // journal; a later failure is "post-persistence" and subject to
        // `rollback_on_failure`.
        let identity = memory.owner.clone();
        let (encrypt_result, encrypt_step) = match &self.encryption {
            Some(engine) => StepExecution::record(PipelineStep::Encrypt, || {
                engine.encrypt(memory.content.as_bytes(), identity.as_bytes()).map(|(ciphertext, _backup_key)| ciphertext).map_err(|e| e.message)
            }),
            None => (Some(memory.content.as_bytes().to_vec()), StepExecution::skipped(PipelineStep::Encrypt)),
        };
        steps.push(encrypt_step);
        let Some(payload) = encrypt_result else {
            return self.compensate_and_finish(memory_id, &memory.owner, vector_id, steps);
        };

        let (blob_id, blob_step) = StepExecution::record(PipelineStep::BlobPut, || {
            self.with_retries(|| self.blob_store.put(&payload, &memory.owner, DEFAULT_RETENTION_EPOCHS, &[]))
        });
        steps.push(blob_step);
        let Some(blob_id) = blob_id else {
            return self.compensate_and_finish(memory_id, &memory.owner, vector_id, steps);
        };

        let metadata = MemoryMetadata::for_memory(&memory, "text/plain");
        let (created_id, record_step) = StepExecution::record(PipelineStep::RecordCreate, || -> Result<String, String> {
            let build = || -> PdwResult<()> {
                let tx = self.registry.build_create_memory_record(CreateMemoryRecordArgs {
                    category: &memory.category,
                    vector_id,
                    blob_id: &blob_id,
                    metadata: &metadata,
                })?;
                submitter.submit(tx)
            };
            build().map(|()| memory_id.clone()).map_err(|e| e.message)
        });
        steps.push(record_step);
        match created_id {
            Some(id) => self.finish(memory_id, steps, Some(id), false),
            None => self.compensate_and_finish(memory.id.clone(), &memory.owner, vector_id, steps),
        }
    }

    /// Graph extraction never aborts the pipeline — it's documented as
    /// optional and best-effort. A failure is recorded but the
    /// memory still proceeds with no delta.
    fn run_graph_update(&self, memory: &Memory, steps: &mut Vec<StepExecution>) -> Option<GraphDelta> {
        if !self.graph_config.enabled {
            steps.push(StepExecution::skipped(PipelineStep::GraphUpdate));
            return None;
        }
        let Some(extractor) = &self.extractor else {
            steps.push(StepExecution::skipped(PipelineStep::GraphUpdate));
            return None;
        };
        let (delta, step) = StepExecution::record(PipelineStep::GraphUpdate, || {
            extractor.extract(&memory.content).map_err(|e| e.message)
        });
        steps.push(step);
        delta
    }

    fn compensate_and_finish(&self, memory_id: String, owner: &str, vector_id: u64, steps: Vec<StepExecution>) -> ExecutionRecord {
        if self.config.rollback_on_failure {
            self.batch.enqueue_tombstone(owner, vector_id);
            info!(owner, vector_id, "rolled back: vector tombstoned, no record published");
            return self.finish(memory_id, steps, None, true);
        }
        self.finish(memory_id, steps, None, false)
    }

    fn finish(&self, memory_id: String, steps: Vec<StepExecution>, memory_id_created: Option<String>, rolled_back: bool) -> ExecutionRecord {
        ExecutionRecord { memory_id, steps, memory_id_created, rolled_back }
    }

    /// Runs `ingest` over many memories on a pool capped at `concurrency`
    /// threads, invoking `progress` once per completed execution.
    pub fn ingest_batch(&self, memories: Vec<Memory>, concurrency: usize, submitter: &(dyn ITxSubmitter + Sync), progress: impl Fn(&ExecutionRecord) + Send + Sync) -> Vec<ExecutionRecord> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .build()
            .expect("failed to build bounded ingest thread pool");
        let progress = Mutex::new(progress);
        pool.install(|| {
            memories
                .into_par_iter()
                .map(|memory| {
                    let record = self.ingest(memory, submitter);
                    (progress.lock().unwrap())(&record);
                    record
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use pdw_core::config::{BatchConfig, VectorIndexConfig};
    use pdw_core::errors::PdwError;
    use pdw_core::model::{Entity, Relationship};
    use pdw_core::traits::UnsignedTx;
    use test_fixtures::{FakeBlobStore, FakeEmbeddingProvider, FakeOwnershipRegistry};

    use super::*;

    struct FakeSubmitter<'a> {
        owner: &'a str,
        registry: &'a FakeOwnershipRegistry,
    }

    impl ITxSubmitter for FakeSubmitter<'_> {
        fn submit(&self, tx: UnsignedTx) -> PdwResult<()> {
            self.registry.apply_as(self.owner, &tx)
        }
    }

    struct FailingBlobStore;
    impl IBlobStore for FailingBlobStore {
        fn put(&self, _bytes: &[u8], _owner: &str, _retention_epochs: u32, _tags: &[(String, String)]) -> PdwResult<String> {
            Err(PdwError::unavailable("blob backend unreachable"))
        }
        fn get(&self, _blob_id: &str) -> PdwResult<Vec<u8>> {
            Err(PdwError::not_found("nothing was ever stored"))
        }
        fn exists(&self, _blob_id: &str) -> PdwResult<bool> {
            Ok(false)
        }
    }

    struct FailingExtractor;
    impl IGraphExtractor for FailingExtractor {
        fn extract(&self, _text: &str) -> PdwResult<GraphDelta> {
            Err(PdwError::internal("extractor crashed"))
        }
    }

    struct CountingExtractor(AtomicUsize);
    impl IGraphExtractor for CountingExtractor {
        fn extract(&self, _text: &str) -> PdwResult<GraphDelta> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(GraphDelta {
                entities: vec![Entity { id: "e1".to_string(), label: "zephyr".to_string(), entity_type: "pet".to_string(), confidence: 0.9 }],
                relationships: Vec::<Relationship>::new(),
            })
        }
    }

    fn orchestrator(
        blob_store: Arc<dyn IBlobStore>,
        registry: Arc<FakeOwnershipRegistry>,
        extractor: Option<Box<dyn IGraphExtractor>>,
    ) -> (PipelineOrchestrator, Arc<BatchCoordinator>) {
        let registry_trait_object: Arc<dyn IOwnershipRegistry> = registry.clone();
        let batch = Arc::new(BatchCoordinator::new(
            VectorIndexConfig::default(),
            GraphConfig::default(),
            BatchConfig { max_pending: 100, max_delay_ms: 999_999, max_cas_retries: 3, idle_eviction_secs: 600 },
            blob_store.clone(),
            registry_trait_object.clone(),
        ));
        let orchestrator = PipelineOrchestrator::new(
            PipelineConfig { rollback_on_failure: true, skip_failed_steps: false, max_retry_attempts: 1 },
            GraphConfig { enabled: extractor.is_some(), confidence_threshold: 0.0 },
            ContentClassifier::deterministic(),
            Arc::new(FakeEmbeddingProvider::new(8)),
            extractor,
            None,
            blob_store,
            registry_trait_object,
            batch.clone(),
        );
        (orchestrator, batch)
    }

    #[test]
    fn happy_path_ingest_publishes_a_memory_record() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store: Arc<dyn IBlobStore> = Arc::new(FakeBlobStore::new());
        let (orchestrator, _batch) = orchestrator(blob_store, registry.clone(), None);
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memory = Memory::new("m1", "0xUA", "my cat's name is zephyr");
        let record = orchestrator.ingest(memory, &submitter);

        assert!(record.succeeded(), "steps: {:?}", record.steps);
        assert_eq!(record.memory_id_created.as_deref(), Some("m1"));
        assert_eq!(registry.list_user_memories("0xUA").unwrap().len(), 1);
    }

    #[test]
    fn dev_mode_skips_encryption_and_stores_plaintext() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store = Arc::new(FakeBlobStore::new());
        let (orchestrator, _batch) = orchestrator(blob_store.clone(), registry.clone(), None);
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memory = Memory::new("m2", "0xUA", "plaintext dev content");
        let record = orchestrator.ingest(memory, &submitter);

        assert!(record.succeeded());
        let encrypt_step = record.steps.iter().find(|s| s.step == PipelineStep::Encrypt).unwrap();
        assert_eq!(encrypt_step.status, StepStatus::Skipped);
        assert_eq!(blob_store.len(), 1);
    }

    #[test]
    fn graph_extraction_failure_is_never_fatal() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store: Arc<dyn IBlobStore> = Arc::new(FakeBlobStore::new());
        let (orchestrator, _batch) = orchestrator(blob_store, registry.clone(), Some(Box::new(FailingExtractor)));
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memory = Memory::new("m3", "0xUA", "quarterly report due friday");
        let record = orchestrator.ingest(memory, &submitter);

        let graph_step = record.steps.iter().find(|s| s.step == PipelineStep::GraphUpdate).unwrap();
        assert_eq!(graph_step.status, StepStatus::Failed);
        assert!(record.succeeded(), "a failed graph update must not fail the pipeline: {:?}", record.steps);
    }

    #[test]
    fn successful_graph_extraction_feeds_the_batch_journal() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store: Arc<dyn IBlobStore> = Arc::new(FakeBlobStore::new());
        let extractor = Box::new(CountingExtractor(AtomicUsize::new(0)));
        let (orchestrator, _batch) = orchestrator(blob_store, registry.clone(), Some(extractor));
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memory = Memory::new("m4", "0xUA", "my cat's name is zephyr");
        let record = orchestrator.ingest(memory, &submitter);

        assert!(record.succeeded());
        let graph_step = record.steps.iter().find(|s| s.step == PipelineStep::GraphUpdate).unwrap();
        assert_eq!(graph_step.status, StepStatus::Success);
    }

    #[test]
    fn blob_put_failure_rolls_back_and_tombstones_the_vector() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store: Arc<dyn IBlobStore> = Arc::new(FailingBlobStore);
        let (orchestrator, batch) = orchestrator(blob_store, registry.clone(), None);
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memory = Memory::new("m5", "0xUA", "this will never make it to a blob");
        let record = orchestrator.ingest(memory, &submitter);

        assert!(!record.succeeded());
        assert!(record.rolled_back);
        assert!(record.memory_id_created.is_none());
        assert_eq!(batch.pending_vectors("0xUA").len(), 1, "the tombstone op should still be visible pre-flush");
    }

    #[test]
    fn ingest_batch_reports_progress_once_per_memory() {
        let registry = Arc::new(FakeOwnershipRegistry::new());
        let blob_store: Arc<dyn IBlobStore> = Arc::new(FakeBlobStore::new());
        let (orchestrator, _batch) = orchestrator(blob_store, registry.clone(), None);
        let submitter = FakeSubmitter { owner: "0xUA", registry: &registry };

        let memories = (0..5).map(|i| Memory::new(format!("m{i}"), "0xUA", format!("memory number {i}"))).collect::<Vec<_>>();
        let seen = StdMutex::new(0usize);
        let records = orchestrator.ingest_batch(memories, 2, &submitter, |_record| {
            *seen.lock().unwrap() += 1;
        });

        assert_eq!(records.len(), 5);
        assert_eq!(*seen.lock().unwrap(), 5);
        assert!(records.iter().all(|r| r.succeeded()));
    }
}
