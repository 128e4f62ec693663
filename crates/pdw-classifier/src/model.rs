//! The LLM seam and the on-the-wire shape of its classification response.

use serde::Deserialize;

use pdw_core::errors::PdwResult;
use pdw_core::model::Sentiment;

/// An external classification model. Implementations are free to call out
/// to whatever LLM backend they like; this crate only ever consumes the
/// returned JSON text and treats it as untrusted input.
pub trait IClassificationModel: Send + Sync {
    fn classify_raw(&self, text: &str) -> PdwResult<String>;
}

/// The shape a well-formed model response takes. Every field is optional
/// because the model is an external, untrusted boundary — a response
/// missing a field (or with the wrong type) falls back to defaults on a
/// per-field basis rather than failing the whole parse.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawClassification {
    pub categories: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
    pub importance: Option<u8>,
    pub sentiment: Option<Sentiment>,
    pub confidence: Option<f64>,
}
