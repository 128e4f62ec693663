//! HTTP embedding provider: `POST /embed { model, input, task_type }`.

use serde::{Deserialize, Serialize};

use pdw_core::errors::{ErrorKind, PdwError, PdwResult};
use pdw_core::traits::EmbeddingKind;

const MAX_INPUT_CHARS: usize = 8192;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    task_type: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
}

fn task_type(kind: EmbeddingKind) -> &'static str {
    match kind {
        EmbeddingKind::Document => "RETRIEVAL_DOCUMENT",
        EmbeddingKind::Query => "RETRIEVAL_QUERY",
    }
}

/// Thin client over the provider's `/embed` endpoint. Holds no cache or
/// rate-limiting state of its own — `EmbeddingEngine` owns those concerns.
pub struct HttpEmbeddingProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed one text. Validates length first (`InvalidInput`, never
    /// retried); network/5xx failures surface as `Unavailable`; 429 as
    /// `RateLimited` — both retried by the caller with backoff.
    pub fn embed_one(&self, text: &str, kind: EmbeddingKind) -> PdwResult<Vec<f32>> {
        validate_input(text)?;

        let body = EmbedRequest {
            model: &self.model,
            input: text,
            task_type: task_type(kind),
        };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| PdwError::unavailable(format!("embedding provider unreachable: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(PdwError::rate_limited("embedding provider rate-limited the request"));
        }
        if !status.is_success() {
            return Err(PdwError::unavailable(format!(
                "embedding provider returned status {status}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| PdwError::internal(format!("malformed embedding response: {e}")))?;

        if parsed.vector.len() != self.dimension {
            return Err(PdwError::new(
                ErrorKind::Internal,
                format!(
                    "provider returned {} dims, expected {}",
                    parsed.vector.len(),
                    self.dimension
                ),
            ));
        }

        Ok(parsed.vector)
    }
}

fn validate_input(text: &str) -> PdwResult<()> {
    if text.is_empty() {
        return Err(PdwError::invalid_input("cannot embed empty text"));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(PdwError::invalid_input(format!(
            "text exceeds provider limit of {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok(())
}
