//! Application layer for research-swarm
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{EvaluationConfig, OrchestratorParams};
pub use ports::{
    agent::{AgentError, TranscriptAgent},
    audit::{AuditEvent, AuditLogger, NoAudit},
    progress::{NoProgress, WaveProgressNotifier},
    queue_store::{QueueStore, StoreError, Subscription},
};
pub use registry::AgentRegistry;
pub use use_cases::client::{BatchStatus, ClientError, QueueCounts, TaskQueueClient, VocabularyFeed};
pub use use_cases::orchestrator::{
    MaintenanceReport, Orchestrator, OrchestratorError, ProcessOutcome,
};
pub use use_cases::process_task::ProcessTaskUseCase;
pub use use_cases::run_waves::{RunWavesInput, RunWavesUseCase};
