//! Per-user knowledge graph store (C4): entity/relationship upsert with
//! dedup and confidence filtering, bounded-depth neighbor traversal.

mod store;

pub use store::PerUserGraphStore;
