//! Transcript agent port
//!
//! Every analysis agent implements [`TranscriptAgent`]. Agents are stateless
//! between calls and validate their own input: malformed or suspicious text
//! produces an empty result, never an error. `Err` is reserved for the agent
//! itself breaking.

use async_trait::async_trait;
use swarm_domain::{AgentId, AgentProfile, AgentResult, AnalysisContext, Wave};
use thiserror::Error;

/// Errors an agent may raise while analyzing
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Agent timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Agent panicked: {0}")]
    Panicked(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

#[async_trait]
pub trait TranscriptAgent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    fn id(&self) -> AgentId {
        self.profile().id
    }

    fn wave(&self) -> Wave {
        self.profile().wave
    }

    /// Analyze `text` with the results of all earlier waves in `context`.
    async fn analyze(
        &self,
        text: &str,
        context: &AnalysisContext,
    ) -> Result<AgentResult, AgentError>;
}
