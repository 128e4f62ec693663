//! Batch coordinator (C9): per-user vector/graph journal, debounced flush,
//! and bounded CAS retry against the ownership registry.

mod coordinator;
mod journal;

pub use coordinator::{BatchCoordinator, ITxSubmitter};
pub use journal::{GraphDelta, PendingOp, UserJournal};
