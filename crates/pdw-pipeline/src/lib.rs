//! Ordered per-memory ingest pipeline: classify, embed, vector-index
//! enqueue, optional graph update, encrypt, blob put, and finally publish a
//! memory record — with partial-failure handling and a batch mode.

mod execution;
mod extraction;
mod orchestrator;

pub use execution::{ExecutionRecord, PipelineStep, StepExecution, StepStatus};
pub use extraction::{IGraphExtractor, NoopExtractor};
pub use orchestrator::PipelineOrchestrator;
