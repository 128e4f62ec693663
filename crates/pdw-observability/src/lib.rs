//! Structured tracing setup, degradation tracking, and per-subsystem
//! health/metrics reporting shared across the rest of the workspace.

mod degradation;
mod engine;
mod health;
mod metrics;
mod tracing_setup;

pub use degradation::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use engine::ObservabilityEngine;
pub use health::{HealthReport, HealthReporter, HealthSnapshot, HealthStatus, SubsystemHealth};
pub use metrics::{BatchMetrics, EncryptionMetrics, MetricsCollector, PipelineMetrics, RetrievalMetrics};
pub use tracing_setup::{init_tracing, init_tracing_json};
