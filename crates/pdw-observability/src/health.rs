//! Aggregate health reporting over the subsystems a deployment cares most
//! about at a glance: the per-user write journal, the vector index's
//! tombstone load, and the key-server fleet's threshold availability. Turns
//! a snapshot of numbers the caller already has into a `HealthReport`,
//! rather than reaching into live subsystems itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub subsystems: Vec<SubsystemHealth>,
}

/// The numbers a caller (typically whoever owns the `BatchCoordinator` and
/// `EncryptionEngine` for a deployment) already has on hand to describe
/// current load, passed in rather than queried live.
#[derive(Debug, Clone, Default)]
pub struct HealthSnapshot {
    pub pending_writes: usize,
    pub max_pending: usize,
    pub active_users: usize,
    pub last_flush_age_secs: Option<i64>,
    /// `HnswIndex::compaction_hint()`'s tombstone-to-live ratio.
    pub tombstone_ratio: f64,
    pub key_servers_reachable: u8,
    pub key_servers_required: u8,
}

pub struct HealthReporter;

impl HealthReporter {
    pub fn build(snapshot: &HealthSnapshot) -> HealthReport {
        let subsystems = vec![Self::batch_health(snapshot), Self::vector_index_health(snapshot), Self::encryption_health(snapshot)];
        let overall_status = Self::derive_overall(&subsystems);
        HealthReport { overall_status, subsystems }
    }

    fn batch_health(snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.max_pending == 0 {
            HealthStatus::Healthy
        } else {
            let load = snapshot.pending_writes as f64 / snapshot.max_pending as f64;
            if load >= 2.0 {
                HealthStatus::Unhealthy
            } else if load >= 1.0 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            }
        };
        let message = (status != HealthStatus::Healthy).then(|| format!("{} pending writes across {} users", snapshot.pending_writes, snapshot.active_users));
        SubsystemHealth { name: "batch".to_string(), status, message }
    }

    fn vector_index_health(snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.tombstone_ratio >= 0.8 {
            HealthStatus::Unhealthy
        } else if snapshot.tombstone_ratio >= 0.5 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        let message = (status != HealthStatus::Healthy).then(|| format!("tombstone ratio {:.2} — a compaction pass would help", snapshot.tombstone_ratio));
        SubsystemHealth { name: "vector_index".to_string(), status, message }
    }

    fn encryption_health(snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.key_servers_reachable < snapshot.key_servers_required {
            HealthStatus::Unhealthy
        } else if snapshot.key_servers_reachable < snapshot.key_servers_required.saturating_add(1) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        let message =
            (status != HealthStatus::Healthy).then(|| format!("{} of {} key servers reachable", snapshot.key_servers_reachable, snapshot.key_servers_required));
        SubsystemHealth { name: "encryption".to_string(), status, message }
    }

    fn derive_overall(subsystems: &[SubsystemHealth]) -> HealthStatus {
        let mut worst = HealthStatus::Healthy;
        for s in subsystems {
            match s.status {
                HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
                HealthStatus::Degraded => worst = HealthStatus::Degraded,
                HealthStatus::Healthy => {}
            }
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_snapshot() -> HealthSnapshot {
        HealthSnapshot { pending_writes: 10, max_pending: 100, active_users: 3, last_flush_age_secs: Some(5), tombstone_ratio: 0.1, key_servers_reachable: 3, key_servers_required: 2 }
    }

    #[test]
    fn all_subsystems_nominal_yields_healthy_overall() {
        let report = HealthReporter::build(&healthy_snapshot());
        assert_eq!(report.overall_status, HealthStatus::Healthy);
        assert!(report.subsystems.iter().all(|s| s.status == HealthStatus::Healthy));
    }

    #[test]
    fn overloaded_batch_journal_is_unhealthy() {
        let snapshot = HealthSnapshot { pending_writes: 250, ..healthy_snapshot() };
        let report = HealthReporter::build(&snapshot);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[test]
    fn high_tombstone_ratio_degrades_vector_index() {
        let snapshot = HealthSnapshot { tombstone_ratio: 0.6, ..healthy_snapshot() };
        let report = HealthReporter::build(&snapshot);
        let vector_index = report.subsystems.iter().find(|s| s.name == "vector_index").unwrap();
        assert_eq!(vector_index.status, HealthStatus::Degraded);
        assert_eq!(report.overall_status, HealthStatus::Degraded);
    }

    #[test]
    fn below_threshold_key_servers_is_unhealthy_overall() {
        let snapshot = HealthSnapshot { key_servers_reachable: 1, key_servers_required: 2, ..healthy_snapshot() };
        let report = HealthReporter::build(&snapshot);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[test]
    fn degraded_beats_healthy_but_unhealthy_wins_overall() {
        let snapshot = HealthSnapshot { tombstone_ratio: 0.6, key_servers_reachable: 0, key_servers_required: 2, ..healthy_snapshot() };
        let report = HealthReporter::build(&snapshot);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }
}
