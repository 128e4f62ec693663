//! Tracks every time a subsystem falls back to a lower-quality mode —
//! embedding provider unreachable, a key server denying or timing out, the
//! blob store's local fallback kicking in — so operators can see when and
//! how often it happened.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationEvent {
    pub component: String,
    pub failure: String,
    pub fallback_used: String,
    pub timestamp: DateTime<Utc>,
}

impl DegradationEvent {
    pub fn now(component: impl Into<String>, failure: impl Into<String>, fallback_used: impl Into<String>) -> Self {
        Self { component: component.into(), failure: failure.into(), fallback_used: fallback_used.into(), timestamp: Utc::now() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Active,
    Recovered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct DegradationTracker {
    events: Vec<TrackedDegradation>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: DegradationEvent) {
        warn!(component = %event.component, failure = %event.failure, fallback = %event.fallback_used, "subsystem degraded");
        self.events.push(TrackedDegradation { event, recovery_status: RecoveryStatus::Active, recovered_at: None });
    }

    /// Marks the most recent still-active degradation for `component` as
    /// recovered. A no-op if nothing is currently active for it.
    pub fn mark_recovered(&mut self, component: &str) {
        let now = Utc::now();
        if let Some(tracked) = self.events.iter_mut().rev().find(|t| t.event.component == component && t.recovery_status == RecoveryStatus::Active) {
            tracked.recovery_status = RecoveryStatus::Recovered;
            tracked.recovered_at = Some(now);
        }
    }

    pub fn events(&self) -> &[TrackedDegradation] {
        &self.events
    }

    pub fn active_degradations(&self) -> Vec<&TrackedDegradation> {
        self.events.iter().filter(|t| t.recovery_status == RecoveryStatus::Active).collect()
    }

    pub fn count_recent(&self, component: &str, window: Duration) -> usize {
        let cutoff = Utc::now() - window;
        self.events.iter().filter(|t| t.event.component == component && t.event.timestamp > cutoff).count()
    }

    /// How long `component` has been continuously degraded, or `None` if
    /// it isn't currently degraded.
    pub fn degraded_duration(&self, component: &str) -> Option<Duration> {
        let earliest = self
            .events
            .iter()
            .filter(|t| t.event.component == component && t.recovery_status == RecoveryStatus::Active)
            .map(|t| t.event.timestamp)
            .min()?;
        Some(Utc::now() - earliest)
    }
}
