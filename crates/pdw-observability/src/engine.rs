//! Wires health reporting, metrics collection, and degradation tracking
//! behind one handle, centralizing a deployment's observability surface in
//! one crate.

use chrono::Duration;

use crate::degradation::{DegradationEvent, DegradationTracker, TrackedDegradation};
use crate::health::{HealthReport, HealthReporter, HealthSnapshot};
use crate::metrics::MetricsCollector;

#[derive(Debug, Default)]
pub struct ObservabilityEngine {
    metrics: MetricsCollector,
    degradation: DegradationTracker,
}

impl ObservabilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health_report(&self, snapshot: &HealthSnapshot) -> HealthReport {
        HealthReporter::build(snapshot)
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricsCollector {
        &mut self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    pub fn record_degradation(&mut self, event: DegradationEvent) {
        self.degradation.record(event);
    }

    pub fn mark_recovered(&mut self, component: &str) {
        self.degradation.mark_recovered(component);
    }

    pub fn active_degradations(&self) -> Vec<&TrackedDegradation> {
        self.degradation.active_degradations()
    }

    pub fn degradation_count_recent(&self, component: &str, window: Duration) -> usize {
        self.degradation.count_recent(component, window)
    }
}
