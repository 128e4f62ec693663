//! ContentClassifier — assigns category/topic/importance/sentiment/confidence
//! to a memory's text, falling back to deterministic defaults whenever no
//! model is wired up or the model's output can't be trusted.

use tracing::{debug, warn};

use crate::model::{IClassificationModel, RawClassification};
use crate::result::ClassificationResult;

pub struct ContentClassifier {
    model: Option<Box<dyn IClassificationModel>>,
}

impl ContentClassifier {
    /// A classifier with no backing model: every call returns the
    /// deterministic fallback.
    pub fn deterministic() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: Box<dyn IClassificationModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Never fails: a model error or an unparseable response degrades to
    /// [`ClassificationResult::default_fallback`] rather than surfacing an
    /// error to the orchestrator.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let Some(model) = &self.model else {
            debug!("no classification model configured, using deterministic fallback");
            return ClassificationResult::default_fallback();
        };

        match model.classify_raw(text) {
            Ok(raw_json) => Self::parse_defensively(&raw_json),
            Err(e) => {
                warn!(error = %e, "classification model call failed, using fallback");
                ClassificationResult::default_fallback()
            }
        }
    }

    fn parse_defensively(raw_json: &str) -> ClassificationResult {
        let fallback = ClassificationResult::default_fallback();
        let parsed: RawClassification = match serde_json::from_str(raw_json) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "classification response was not valid JSON, using fallback");
                return fallback;
            }
        };

        let categories = parsed
            .categories
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback.categories.clone());
        let importance = parsed.importance.map(|v| v.clamp(1, 10)).unwrap_or(fallback.importance);
        let confidence = parsed
            .confidence
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(fallback.confidence);
        let sentiment = parsed.sentiment.unwrap_or(fallback.sentiment);
        let topics = parsed.topics.unwrap_or_default();

        ClassificationResult {
            categories,
            topics,
            importance,
            sentiment,
            confidence,
        }
    }
}
