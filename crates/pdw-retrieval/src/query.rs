//! Query and result types exchanged with the retrieval engine.

use chrono::{DateTime, Utc};

use pdw_core::model::MemoryMetadata;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query_text: String,
    pub user: String,
    pub k: usize,
    pub category: Option<String>,
    pub min_similarity: Option<f32>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl SearchQuery {
    pub fn new(query_text: impl Into<String>, user: impl Into<String>, k: usize) -> Self {
        Self {
            query_text: query_text.into(),
            user: user.into(),
            k,
            category: None,
            min_similarity: None,
            time_range: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub memory_id: String,
    pub similarity: f32,
    pub metadata: MemoryMetadata,
}

/// Input to [`crate::RetrievalEngine::assemble_context`].
#[derive(Debug, Clone)]
pub struct AssembleContextQuery {
    pub query_text: String,
    pub user: String,
    pub k: usize,
    pub requesting_wallet: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContextStats {
    pub embed_ms: u64,
    pub search_ms: u64,
    pub decrypt_ms: u64,
    pub found: usize,
    pub allowed: usize,
}

#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub context_string: String,
    pub memories_used: Vec<String>,
    pub stats: ContextStats,
}
