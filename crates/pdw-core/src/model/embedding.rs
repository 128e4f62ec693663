use serde::{Deserialize, Serialize};

/// A fixed-dimension, cosine-normalized embedding vector.
///
/// Normalization happens client-side at ingest (C1) so downstream indices
/// can assume unit vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEmbedding {
    pub dimension: usize,
    pub values: Vec<f32>,
    pub model_id: String,
}

impl VectorEmbedding {
    pub fn new(values: Vec<f32>, model_id: impl Into<String>) -> Self {
        let dimension = values.len();
        Self {
            dimension,
            values,
            model_id: model_id.into(),
        }
    }

    /// L2-normalize in place. A zero vector is left untouched — normalizing
    /// it would divide by zero and there's no sensible "direction" for it.
    pub fn normalize(&mut self) {
        let norm: f32 = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    pub fn is_normalized(&self, tolerance: f32) -> bool {
        let norm: f32 = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        (norm - 1.0).abs() <= tolerance
    }
}
