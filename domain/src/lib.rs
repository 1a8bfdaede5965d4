//! Domain layer for research-swarm
//!
//! Pure types and pure functions for the transcript-analysis swarm. No I/O
//! and no async runtime: everything here can be tested with plain values.
//!
//! # Core Concepts
//!
//! ## Agents and waves
//!
//! Nineteen declarative agents ([`agent::catalog`]) scan a transcript for
//! their vocabulary. They run in four ordered [`Wave`]s; each wave sees the
//! results of the waves before it through a [`WaveTable`].
//!
//! ## Evaluation
//!
//! - **Scoring**: [`ScoringRubric`] folds seven weighted dimensions into a
//!   0-10 composite.
//! - **Thermopylae gate**: [`GatePair`] cross-checks the risk detector
//!   against the legitimacy validator; any disagreement forces review.
//! - **Routing**: [`RoutingPolicy`] sends each task to exactly one terminal
//!   queue.

pub mod agent;
pub mod config;
pub mod coordination;
pub mod core;
pub mod gate;
pub mod routing;
pub mod scoring;
pub mod task;
pub mod util;
pub mod vocabulary;
pub mod wave;

// Re-export commonly used types
pub use agent::{
    AgentId, AgentOutcome, AgentProfile, AgentResult, Finding, InputRejection, Pattern,
    PatternStrength, PermissionTier, ScanOutcome, VocabularyCategory, Wave, sanitize_input,
    scan_vocabulary,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use coordination::{
    InstanceId, InstanceStatus, OrchestratorKind, OrchestratorRegistration, QueueKeys,
};
pub use core::error::DomainError;
pub use gate::{CrossValidation, Disagreement, GatePair, GateStatus};
pub use routing::{RoutingDecision, RoutingPolicy, RoutingReason, TerminalQueue};
pub use scoring::{CompositeScore, Dimension, DimensionScore, ScoringRubric};
pub use task::{FailureRecord, Task, TaskId, TaskResult, TerminalRecord};
pub use vocabulary::{VocabularyBroadcast, VocabularyUpdate, collect_updates};
pub use wave::{AnalysisContext, WaveTable, context_key};
