use pdw_core::model::Sentiment;

/// The output of [`crate::ContentClassifier::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub categories: Vec<String>,
    pub topics: Vec<String>,
    pub importance: u8,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

impl ClassificationResult {
    /// The deterministic fallback used whenever no model is configured, the
    /// model call fails, or its response can't be parsed: category
    /// `general`, importance `5`, confidence `0.5`. Never fails
    /// the pipeline.
    pub fn default_fallback() -> Self {
        Self {
            categories: vec!["general".to_string()],
            topics: Vec::new(),
            importance: 5,
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
        }
    }
}
