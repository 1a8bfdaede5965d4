//! Application-level configuration.
//!
//! - [`OrchestratorParams`]: claim loop, heartbeat and lease timing
//! - [`EvaluationConfig`]: scoring, cross-validation and routing policy

pub mod evaluation;
pub mod orchestrator_params;

pub use evaluation::EvaluationConfig;
pub use orchestrator_params::OrchestratorParams;
