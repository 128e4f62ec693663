//! Knowledge-graph extraction is an external collaborator (NER + relation
//! extraction): the orchestrator only needs entities and relationships
//! back, not how they were produced.

use pdw_batch::GraphDelta;
use pdw_core::errors::PdwResult;

pub trait IGraphExtractor: Send + Sync {
    fn extract(&self, text: &str) -> PdwResult<GraphDelta>;
}

/// Extraction disabled: every memory leaves the graph unchanged. Extraction
/// itself is an optional, config-gated step.
pub struct NoopExtractor;

impl IGraphExtractor for NoopExtractor {
    fn extract(&self, _text: &str) -> PdwResult<GraphDelta> {
        Ok(GraphDelta { entities: Vec::new(), relationships: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_extractor_always_returns_an_empty_delta() {
        let delta = NoopExtractor.extract("my cat's name is zephyr").unwrap();
        assert!(delta.entities.is_empty());
        assert!(delta.relationships.is_empty());
    }
}
