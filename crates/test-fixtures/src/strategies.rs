//! Shared proptest strategies for synthetic vectors and memories.

use proptest::collection::vec as pvec;
use proptest::prelude::*;

use pdw_core::model::Memory;

/// A random vector of the given dimension with components in `[-1.0, 1.0]`.
pub fn arb_vector(dimension: usize) -> impl Strategy<Value = Vec<f32>> {
    pvec(-1.0f32..1.0f32, dimension)
}

/// A random in-bounds `Memory` with ASCII content, owned by a fixed test
/// address.
pub fn arb_memory(owner: &'static str) -> impl Strategy<Value = Memory> {
    ("[a-zA-Z0-9 ]{1,200}", 1u8..=10u8).prop_map(move |(content, importance)| {
        let mut memory = Memory::new(uuid::Uuid::new_v4().to_string(), owner, content);
        memory.set_importance(importance);
        memory
    })
}
