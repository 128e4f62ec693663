//! Per-execution step records: each step reports
//! `{started_at, ended_at, status, error?}`.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Classify,
    Embed,
    VectorIndexEnqueue,
    GraphUpdate,
    Encrypt,
    BlobPut,
    RecordCreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct StepExecution {
    pub step: PipelineStep,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: StepStatus,
    pub error: Option<String>,
}

impl StepExecution {
    pub(crate) fn record<F, T>(step: PipelineStep, f: F) -> (Option<T>, StepExecution)
    where
        F: FnOnce() -> Result<T, String>,
    {
        let started_at = Utc::now();
        match f() {
            Ok(value) => {
                let ended_at = Utc::now();
                (Some(value), StepExecution { step, started_at, ended_at, status: StepStatus::Success, error: None })
            }
            Err(message) => {
                let ended_at = Utc::now();
                (None, StepExecution { step, started_at, ended_at, status: StepStatus::Failed, error: Some(message) })
            }
        }
    }

    pub(crate) fn skipped(step: PipelineStep) -> StepExecution {
        let now = Utc::now();
        StepExecution { step, started_at: now, ended_at: now, status: StepStatus::Skipped, error: None }
    }

    pub(crate) fn success(step: PipelineStep) -> StepExecution {
        let now = Utc::now();
        StepExecution { step, started_at: now, ended_at: now, status: StepStatus::Success, error: None }
    }

    pub(crate) fn failed(step: PipelineStep, message: impl Into<String>) -> StepExecution {
        let now = Utc::now();
        StepExecution { step, started_at: now, ended_at: now, status: StepStatus::Failed, error: Some(message.into()) }
    }
}

/// The full record of one memory's trip through the pipeline.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub memory_id: String,
    pub steps: Vec<StepExecution>,
    /// `Some(memory_id)` once `RecordCreate` has submitted successfully.
    /// `submit` only confirms broadcast, not the chain-assigned id, so this
    /// carries the caller's own correlation id (`memory_id`) rather than
    /// whatever id the registry ends up storing the record under.
    pub memory_id_created: Option<String>,
    pub rolled_back: bool,
}

impl ExecutionRecord {
    pub fn succeeded(&self) -> bool {
        !self.rolled_back && self.steps.iter().all(|s| s.status != StepStatus::Failed) && self.memory_id_created.is_some()
    }
}
