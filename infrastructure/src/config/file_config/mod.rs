//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod logging;
mod orchestrator;
mod output;
mod queues;
mod routing;
mod scoring;
mod store;

pub use agents::FileAgentsConfig;
pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use queues::FileQueuesConfig;
pub use routing::FileRoutingConfig;
pub use scoring::FileScoringConfig;
pub use store::FileStoreConfig;

use serde::{Deserialize, Serialize};
use swarm_application::{EvaluationConfig, OrchestratorParams};
use swarm_domain::config::validation::has_errors;
use swarm_domain::{ConfigIssue, Severity};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Claim loop, heartbeat and lease timing
    pub orchestrator: FileOrchestratorConfig,
    /// Acceptance and publish thresholds
    pub routing: FileRoutingConfig,
    /// Composite score weights
    pub scoring: FileScoringConfig,
    /// Agents to leave out
    pub agents: FileAgentsConfig,
    /// Store key namespace
    pub queues: FileQueuesConfig,
    /// Shared store connection
    pub store: FileStoreConfig,
    /// Log and audit destinations
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Orchestrator durations and heartbeat margins
    /// 2. Routing thresholds
    /// 3. Scoring weights
    /// 4. Unknown agent ids in `agents.disabled`
    /// 5. The store URL scheme
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.orchestrator.validate());
        issues.extend(self.routing.validate());
        issues.extend(self.scoring.validate());
        issues.extend(self.agents.parse_disabled().1);
        issues.extend(self.store.validate());
        issues
    }

    /// Validate and fail on errors, handing back the warnings.
    pub fn ensure_valid(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let issues = self.validate();
        if has_errors(&issues) {
            let messages = issues
                .into_iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message)
                .collect();
            return Err(ConfigValidationError::Invalid(messages));
        }
        Ok(issues)
    }

    pub fn orchestrator_params(&self) -> OrchestratorParams {
        self.orchestrator.to_params(self.queues.keys())
    }

    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig::default()
            .with_rubric(self.scoring.to_rubric())
            .with_routing(self.routing.to_policy())
    }
}
