//! # pdw-core
//!
//! Foundation crate for the Personal Data Wallet memory engine.
//! Defines the shared data model, the closed error taxonomy, configuration,
//! and the trait seams every other crate in the workspace implements or
//! consumes.

pub mod config;
pub mod errors;
pub mod model;
pub mod traits;

pub use config::PdwConfig;
pub use errors::{ErrorKind, PdwError, PdwResult};
pub use model::{
    AccessGrant, ContextId, KnowledgeGraph, Memory, MemoryIndexRoot, MemoryMetadata,
    MemoryRecord, Scope, Sentiment, VectorEmbedding,
};
