//! EmbeddingEngine — the main entry point for pdw-embedding.
//!
//! Coordinates RPM limiting, batch splitting with bounded backoff retry,
//! and client-side cosine normalization so downstream indices (`pdw-vector-index`)
//! can assume unit vectors.

use std::time::Duration;

use tracing::{debug, warn};

use pdw_core::config::EmbeddingConfig;
use pdw_core::errors::{ErrorKind, PdwResult};
use pdw_core::model::VectorEmbedding;
use pdw_core::traits::{EmbeddingKind, IEmbeddingProvider};

use crate::provider::HttpEmbeddingProvider;
use crate::rate_limiter::RpmLimiter;

const MAX_RETRY_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

pub struct EmbeddingEngine {
    provider: HttpEmbeddingProvider,
    limiter: RpmLimiter,
    config: EmbeddingConfig,
}

impl EmbeddingEngine {
    pub fn new(base_url: impl Into<String>, config: EmbeddingConfig) -> Self {
        let provider = HttpEmbeddingProvider::new(base_url, config.model.clone(), config.dimension);
        let limiter = RpmLimiter::new(config.requests_per_minute);
        Self {
            provider,
            limiter,
            config,
        }
    }

    /// Embed a single text, cosine-normalized.
    pub fn embed(&self, text: &str, kind: EmbeddingKind) -> PdwResult<VectorEmbedding> {
        self.limiter.acquire();
        let values = self.embed_with_retry(text, kind)?;
        let mut embedding = VectorEmbedding::new(values, self.config.model.clone());
        embedding.normalize();
        Ok(embedding)
    }

    /// Embed a batch, splitting into provider-sized chunks and concatenating
    /// results in order.
    pub fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> PdwResult<Vec<VectorEmbedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            for text in chunk {
                out.push(self.embed(text, kind)?);
            }
        }
        Ok(out)
    }

    fn embed_with_retry(&self, text: &str, kind: EmbeddingKind) -> PdwResult<Vec<f32>> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;
        loop {
            match self.provider.embed_one(text, kind) {
                Ok(v) => return Ok(v),
                Err(e) if e.kind == ErrorKind::InvalidInput => return Err(e),
                Err(e) if matches!(e.kind, ErrorKind::RateLimited | ErrorKind::Unavailable) => {
                    attempt += 1;
                    if attempt >= MAX_RETRY_ATTEMPTS {
                        warn!(attempts = attempt, "embedding provider exhausted retries");
                        return Err(e);
                    }
                    debug!(attempt, ?backoff, kind = ?e.kind, "retrying embedding request");
                    std::thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }
}

impl IEmbeddingProvider for EmbeddingEngine {
    fn embed(&self, text: &str, kind: EmbeddingKind) -> PdwResult<Vec<f32>> {
        EmbeddingEngine::embed(self, text, kind).map(|v| v.values)
    }

    fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> PdwResult<Vec<Vec<f32>>> {
        EmbeddingEngine::embed_batch(self, texts, kind).map(|vs| vs.into_iter().map(|v| v.values).collect())
    }

    fn dimension(&self) -> usize {
        self.provider.dimension()
    }
}
