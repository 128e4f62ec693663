use serde::{Deserialize, Serialize};

/// A node in a user's knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub entity_type: String,
    pub confidence: f64,
}

impl Entity {
    /// Dedup key for entities: `(label_lowercased, type)`.
    pub fn dedup_key(&self) -> (String, String) {
        (self.label.to_lowercase(), self.entity_type.clone())
    }
}

/// A directed edge in a user's knowledge graph. Cycles are permitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub relationship_type: String,
    pub confidence: f64,
}

impl Relationship {
    /// Uniqueness key: `(source, target, type)`.
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.source_entity_id.clone(),
            self.target_entity_id.clone(),
            self.relationship_type.clone(),
        )
    }
}

/// A per-user entity/relationship graph extracted from memories. Represented
/// as two flat collections with stable string ids and no owned cycles
/// — neighbor lookups go through an adjacency map
/// built at deserialize time, owned by `pdw-graph`, not by this struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_dedup_key_lowercases_label() {
        let a = Entity { id: "1".into(), label: "Zephyr".into(), entity_type: "pet".into(), confidence: 0.9 };
        let b = Entity { id: "2".into(), label: "zephyr".into(), entity_type: "pet".into(), confidence: 0.5 };
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn relationship_dedup_key_is_directional() {
        let a = Relationship { id: "1".into(), source_entity_id: "a".into(), target_entity_id: "b".into(), relationship_type: "owns".into(), confidence: 0.9 };
        let b = Relationship { id: "2".into(), source_entity_id: "b".into(), target_entity_id: "a".into(), relationship_type: "owns".into(), confidence: 0.9 };
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
