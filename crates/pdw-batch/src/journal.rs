//! Per-user pending-mutation journal.

use std::collections::VecDeque;
use std::time::Instant;

use pdw_core::model::{Entity, Relationship};

#[derive(Debug, Clone)]
pub struct GraphDelta {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone)]
pub enum PendingOp {
    Insert { vector_id: u64, vector: Vec<f32>, graph_delta: Option<GraphDelta> },
    Tombstone { vector_id: u64 },
}

/// A single user's in-memory journal plus the debounce clock driving the
/// flusher.
pub struct UserJournal {
    pub(crate) pending: VecDeque<PendingOp>,
    first_enqueued_at: Option<Instant>,
    pub(crate) last_activity: Instant,
    /// Lazily seeded from the last persisted snapshot on first allocation;
    /// survives flushes so ids stay strictly sequential.
    pub(crate) next_vector_id: Option<u64>,
}

impl UserJournal {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            first_enqueued_at: None,
            last_activity: Instant::now(),
            next_vector_id: None,
        }
    }

    pub fn push(&mut self, op: PendingOp) {
        if self.first_enqueued_at.is_none() {
            self.first_enqueued_at = Some(Instant::now());
        }
        self.pending.push_back(op);
        self.last_activity = Instant::now();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `max_pending` or `max_delay_ms` has been crossed.
    pub fn should_flush(&self, max_pending: usize, max_delay_ms: u64) -> bool {
        if self.pending.len() >= max_pending {
            return true;
        }
        match self.first_enqueued_at {
            Some(t) => t.elapsed().as_millis() as u64 >= max_delay_ms,
            None => false,
        }
    }

    /// Returns all pending vector inserts visible so far, in enqueue order
    /// — consulted by reads before falling back to the last persisted
    /// snapshot.
    pub fn pending_vectors(&self) -> Vec<(u64, &[f32])> {
        self.pending
            .iter()
            .filter_map(|op| match op {
                PendingOp::Insert { vector_id, vector, .. } => Some((*vector_id, vector.as_slice())),
                PendingOp::Tombstone { .. } => None,
            })
            .collect()
    }

    pub fn pending_tombstones(&self) -> Vec<u64> {
        self.pending
            .iter()
            .filter_map(|op| match op {
                PendingOp::Tombstone { vector_id } => Some(*vector_id),
                PendingOp::Insert { .. } => None,
            })
            .collect()
    }

    pub(crate) fn reset_after_flush(&mut self) {
        self.pending.clear();
        self.first_enqueued_at = None;
    }
}

impl Default for UserJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_triggers_on_max_pending() {
        let mut journal = UserJournal::new();
        for i in 0..3 {
            journal.push(PendingOp::Insert { vector_id: i, vector: vec![0.0], graph_delta: None });
        }
        assert!(journal.should_flush(3, 999_999));
        assert!(!journal.should_flush(10, 999_999));
    }

    #[test]
    fn empty_journal_never_flushes_on_time() {
        let journal = UserJournal::new();
        assert!(!journal.should_flush(100, 0));
    }

    #[test]
    fn pending_vectors_preserve_enqueue_order() {
        let mut journal = UserJournal::new();
        journal.push(PendingOp::Insert { vector_id: 5, vector: vec![1.0], graph_delta: None });
        journal.push(PendingOp::Insert { vector_id: 2, vector: vec![2.0], graph_delta: None });
        let ids: Vec<u64> = journal.pending_vectors().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[test]
    fn reset_clears_pending_and_debounce_clock() {
        let mut journal = UserJournal::new();
        journal.push(PendingOp::Tombstone { vector_id: 1 });
        journal.reset_after_flush();
        assert!(journal.is_empty());
        assert!(!journal.should_flush(1, 0));
    }
}
