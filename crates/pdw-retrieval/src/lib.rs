//! Query embedding, ANN search over a read-your-writes index snapshot,
//! permission-gated decryption fan-out, and context assembly.

mod engine;
mod query;

pub use engine::RetrievalEngine;
pub use query::{AssembleContextQuery, AssembledContext, ContextStats, SearchQuery, SearchResult};
