//! Content classifier (C2): category/topic/importance/sentiment assignment
//! with deterministic fallback when no model is available or its output
//! can't be trusted.

mod engine;
mod model;
mod result;

pub use engine::ContentClassifier;
pub use model::IClassificationModel;
pub use result::ClassificationResult;
