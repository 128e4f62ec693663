//! PerUserGraphStore — entities and relationships as two flat collections
//! with an auxiliary adjacency structure built at deserialize/mutate time
//!.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pdw_core::errors::{ErrorKind, PdwError, PdwResult};
use pdw_core::model::{Entity, Relationship};
use pdw_core::traits::IKnowledgeGraphStore;

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    confidence_threshold: f64,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

/// Per-user knowledge graph. Entities and relationships are kept in flat
/// `Vec`s for serialization; a `StableDiGraph` plus an id→index map is
/// rebuilt whenever the collections change, and used only for traversal.
pub struct PerUserGraphStore {
    confidence_threshold: f64,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    graph: StableDiGraph<String, f64>,
    node_index: HashMap<String, NodeIndex>,
}

impl PerUserGraphStore {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            entities: Vec::new(),
            relationships: Vec::new(),
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    fn rebuild_adjacency(&mut self) {
        self.graph = StableDiGraph::new();
        self.node_index = HashMap::new();
        for entity in &self.entities {
            let idx = self.graph.add_node(entity.id.clone());
            self.node_index.insert(entity.id.clone(), idx);
        }
        for rel in &self.relationships {
            if let (Some(&src), Some(&dst)) = (
                self.node_index.get(&rel.source_entity_id),
                self.node_index.get(&rel.target_entity_id),
            ) {
                self.graph.add_edge(src, dst, rel.confidence);
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }
}

impl IKnowledgeGraphStore for PerUserGraphStore {
    fn upsert_entities(&mut self, entities: Vec<Entity>) -> PdwResult<()> {
        for incoming in entities {
            if incoming.confidence < self.confidence_threshold {
                debug!(entity = %incoming.label, confidence = incoming.confidence, "entity below confidence threshold, dropped");
                continue;
            }
            let key = incoming.dedup_key();
            if let Some(existing) = self
                .entities
                .iter_mut()
                .find(|e| e.dedup_key() == key)
            {
                *existing = incoming;
            } else {
                self.entities.push(incoming);
            }
        }
        self.rebuild_adjacency();
        Ok(())
    }

    fn upsert_relationships(&mut self, relationships: Vec<Relationship>) -> PdwResult<()> {
        for incoming in relationships {
            if incoming.confidence < self.confidence_threshold {
                debug!(relationship = %incoming.relationship_type, confidence = incoming.confidence, "relationship below confidence threshold, dropped");
                continue;
            }
            let key = incoming.dedup_key();
            if let Some(existing) = self
                .relationships
                .iter_mut()
                .find(|r| r.dedup_key() == key)
            {
                *existing = incoming;
            } else {
                self.relationships.push(incoming);
            }
        }
        self.rebuild_adjacency();
        Ok(())
    }

    /// Bounded-depth BFS over both edge directions.
    /// The caller is expected to enforce the upper bound; this clamps
    /// defensively rather than trusting it blindly.
    fn neighbors(&self, entity_id: &str, depth: u8) -> PdwResult<Vec<Entity>> {
        let depth = depth.min(3);
        let Some(&start) = self.node_index.get(entity_id) else {
            return Ok(Vec::new());
        };

        let mut visited = std::collections::HashSet::new();
        let mut frontier = vec![start];
        visited.insert(start);

        for _ in 0..depth {
            let mut next = Vec::new();
            for &node in &frontier {
                for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
                for neighbor in self.graph.neighbors_directed(node, Direction::Incoming) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        visited.remove(&start);

        let ids: std::collections::HashSet<&String> =
            visited.iter().filter_map(|idx| self.graph.node_weight(*idx)).collect();
        Ok(self.entities.iter().filter(|e| ids.contains(&e.id)).cloned().collect())
    }

    fn serialize(&self) -> PdwResult<Vec<u8>> {
        let snapshot = GraphSnapshot {
            confidence_threshold: self.confidence_threshold,
            entities: self.entities.clone(),
            relationships: self.relationships.clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| PdwError::internal(format!("graph serialize failed: {e}")))
    }
}

impl PerUserGraphStore {
    pub fn deserialize(bytes: &[u8]) -> PdwResult<Self> {
        let snapshot: GraphSnapshot =
            bincode::deserialize(bytes).map_err(|e| PdwError::new(ErrorKind::Internal, format!("graph deserialize failed: {e}")))?;
        let mut store = Self {
            confidence_threshold: snapshot.confidence_threshold,
            entities: snapshot.entities,
            relationships: snapshot.relationships,
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
        };
        store.rebuild_adjacency();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, label: &str, confidence: f64) -> Entity {
        Entity {
            id: id.to_string(),
            label: label.to_string(),
            entity_type: "person".to_string(),
            confidence,
        }
    }

    fn relationship(id: &str, src: &str, dst: &str, confidence: f64) -> Relationship {
        Relationship {
            id: id.to_string(),
            source_entity_id: src.to_string(),
            target_entity_id: dst.to_string(),
            relationship_type: "knows".to_string(),
            confidence,
        }
    }

    #[test]
    fn low_confidence_entities_are_dropped() {
        let mut store = PerUserGraphStore::new(0.5);
        store.upsert_entities(vec![entity("e1", "Alice", 0.2)]).unwrap();
        assert!(store.entities().is_empty());
    }

    #[test]
    fn dedup_key_merges_repeated_entities() {
        let mut store = PerUserGraphStore::new(0.0);
        store.upsert_entities(vec![entity("e1", "Alice", 0.9)]).unwrap();
        store.upsert_entities(vec![entity("e1", "ALICE", 0.95)]).unwrap();
        assert_eq!(store.entities().len(), 1);
        assert_eq!(store.entities()[0].confidence, 0.95);
    }

    #[test]
    fn neighbors_respects_depth_bound() {
        let mut store = PerUserGraphStore::new(0.0);
        store
            .upsert_entities(vec![entity("a", "A", 0.9), entity("b", "B", 0.9), entity("c", "C", 0.9)])
            .unwrap();
        store
            .upsert_relationships(vec![relationship("r1", "a", "b", 0.9), relationship("r2", "b", "c", 0.9)])
            .unwrap();

        let depth1 = store.neighbors("a", 1).unwrap();
        assert_eq!(depth1.len(), 1);
        assert_eq!(depth1[0].id, "b");

        let depth2 = store.neighbors("a", 2).unwrap();
        let ids: Vec<&str> = depth2.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"b"));
        assert!(ids.contains(&"c"));
    }

    #[test]
    fn neighbors_of_unknown_entity_is_empty() {
        let store = PerUserGraphStore::new(0.0);
        assert!(store.neighbors("missing", 2).unwrap().is_empty());
    }

    #[test]
    fn serialize_round_trips_entities_and_relationships() {
        let mut store = PerUserGraphStore::new(0.0);
        store.upsert_entities(vec![entity("a", "A", 0.9), entity("b", "B", 0.9)]).unwrap();
        store.upsert_relationships(vec![relationship("r1", "a", "b", 0.9)]).unwrap();
        let bytes = store.serialize().unwrap();
        let restored = PerUserGraphStore::deserialize(&bytes).unwrap();
        assert_eq!(restored.entities().len(), 2);
        assert_eq!(restored.relationships().len(), 1);
        assert_eq!(restored.neighbors("a", 1).unwrap().len(), 1);
    }
}
