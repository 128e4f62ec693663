use crate::errors::PdwResult;
use crate::model::{Entity, Relationship};

/// Per-user entity/relationship graph.
pub trait IKnowledgeGraphStore: Send + Sync {
    fn upsert_entities(&mut self, entities: Vec<Entity>) -> PdwResult<()>;
    fn upsert_relationships(&mut self, relationships: Vec<Relationship>) -> PdwResult<()>;
    /// Depth-bounded neighbor traversal (`depth <= 3`).
    fn neighbors(&self, entity_id: &str, depth: u8) -> PdwResult<Vec<Entity>>;
    fn serialize(&self) -> PdwResult<Vec<u8>>;
}
