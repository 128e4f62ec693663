//! Per-subsystem metrics collectors aggregated under one `MetricsCollector`:
//! plain structs with `&mut self` record methods rather than atomics, since
//! a deployment typically owns one collector behind its own lock or
//! single-threaded loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub memories_ingested: u64,
    pub embed_failures: u64,
    pub graph_extractions: u64,
    pub total_embed_ms: u64,
}

impl PipelineMetrics {
    pub fn record_ingested(&mut self, embed_ms: u64) {
        self.memories_ingested += 1;
        self.total_embed_ms += embed_ms;
    }

    pub fn record_embed_failure(&mut self) {
        self.embed_failures += 1;
    }

    pub fn record_graph_extraction(&mut self) {
        self.graph_extractions += 1;
    }

    pub fn average_embed_ms(&self) -> f64 {
        if self.memories_ingested == 0 {
            0.0
        } else {
            self.total_embed_ms as f64 / self.memories_ingested as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub flushes: u64,
    pub cas_retries: u64,
    pub cas_failures: u64,
    pub vectors_flushed: u64,
    pub tombstones_flushed: u64,
}

impl BatchMetrics {
    pub fn record_flush(&mut self, vectors: usize, tombstones: usize) {
        self.flushes += 1;
        self.vectors_flushed += vectors as u64;
        self.tombstones_flushed += tombstones as u64;
    }

    pub fn record_cas_retry(&mut self) {
        self.cas_retries += 1;
    }

    pub fn record_cas_failure(&mut self) {
        self.cas_failures += 1;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub searches: u64,
    pub contexts_assembled: u64,
    pub total_search_ms: u64,
    pub candidates_denied: u64,
}

impl RetrievalMetrics {
    pub fn record_search(&mut self, search_ms: u64) {
        self.searches += 1;
        self.total_search_ms += search_ms;
    }

    pub fn record_context_assembled(&mut self, found: usize, allowed: usize) {
        self.contexts_assembled += 1;
        self.candidates_denied += (found.saturating_sub(allowed)) as u64;
    }

    pub fn average_search_ms(&self) -> f64 {
        if self.searches == 0 {
            0.0
        } else {
            self.total_search_ms as f64 / self.searches as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncryptionMetrics {
    pub encryptions: u64,
    pub decryptions: u64,
    pub decrypt_denials: u64,
    pub sessions_started: u64,
}

impl EncryptionMetrics {
    pub fn record_encryption(&mut self) {
        self.encryptions += 1;
    }

    pub fn record_decryption(&mut self) {
        self.decryptions += 1;
    }

    pub fn record_decrypt_denial(&mut self) {
        self.decrypt_denials += 1;
    }

    pub fn record_session_started(&mut self) {
        self.sessions_started += 1;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsCollector {
    pub pipeline: PipelineMetrics,
    pub batch: BatchMetrics,
    pub retrieval: RetrievalMetrics,
    pub encryption: EncryptionMetrics,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_metrics_track_average_embed_time() {
        let mut metrics = PipelineMetrics::default();
        metrics.record_ingested(10);
        metrics.record_ingested(20);
        assert_eq!(metrics.memories_ingested, 2);
        assert_eq!(metrics.average_embed_ms(), 15.0);
    }

    #[test]
    fn retrieval_metrics_count_denied_candidates() {
        let mut metrics = RetrievalMetrics::default();
        metrics.record_context_assembled(5, 3);
        metrics.record_context_assembled(2, 2);
        assert_eq!(metrics.candidates_denied, 2);
        assert_eq!(metrics.contexts_assembled, 2);
    }

    #[test]
    fn reset_clears_every_subsystem() {
        let mut collector = MetricsCollector::new();
        collector.pipeline.record_ingested(5);
        collector.batch.record_flush(3, 1);
        collector.reset();
        assert_eq!(collector.pipeline.memories_ingested, 0);
        assert_eq!(collector.batch.flushes, 0);
    }
}
