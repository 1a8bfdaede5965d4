//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid wave number: {0}")]
    InvalidWave(u8),

    #[error("Unknown orchestrator kind: {0}")]
    UnknownOrchestratorKind(String),

    #[error("Malformed registration record for {instance}: {reason}")]
    MalformedRegistration { instance: String, reason: String },

    #[error("Invalid scoring rubric: {0}")]
    InvalidRubric(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Check if this error was caused by untrusted input rather than a bug
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownAgent(_)
                | DomainError::InvalidWave(_)
                | DomainError::UnknownOrchestratorKind(_)
                | DomainError::MalformedRegistration { .. }
        )
    }
}
