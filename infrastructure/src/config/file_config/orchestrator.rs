//! Orchestrator configuration from TOML (`[orchestrator]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [orchestrator]
//! kind = "cli"
//! instances = 3
//! heartbeat_interval_secs = 10
//! heartbeat_timeout_secs = 30
//! task_lease_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::OrchestratorParams;
use swarm_domain::{ConfigIssue, ConfigIssueCode, OrchestratorKind, QueueKeys};

/// Raw orchestrator configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Instance flavor recorded in the registration
    pub kind: OrchestratorKind,
    /// Number of instances the batch command runs in-process
    pub instances: usize,
    pub heartbeat_interval_secs: u64,
    /// A peer silent for longer than this is declared dead
    pub heartbeat_timeout_secs: u64,
    /// How long one claim attempt waits on an empty queue
    pub claim_timeout_secs: u64,
    pub retry_backoff_ms: u64,
    /// Claims older than this are requeued even if the owner is alive
    pub task_lease_secs: u64,
    /// Per-agent time limit; `None` disables it
    pub agent_timeout_secs: Option<u64>,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            kind: OrchestratorKind::Cli,
            instances: 1,
            heartbeat_interval_secs: 10,
            heartbeat_timeout_secs: 30,
            claim_timeout_secs: 5,
            retry_backoff_ms: 1000,
            task_lease_secs: 300,
            agent_timeout_secs: Some(60),
        }
    }
}

impl FileOrchestratorConfig {
    pub fn to_params(&self, keys: QueueKeys) -> OrchestratorParams {
        OrchestratorParams::default()
            .with_kind(self.kind)
            .with_heartbeat(
                Duration::from_secs(self.heartbeat_interval_secs),
                Duration::from_secs(self.heartbeat_timeout_secs),
            )
            .with_claim_timeout(Duration::from_secs(self.claim_timeout_secs))
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_task_lease(Duration::from_secs(self.task_lease_secs))
            .with_agent_timeout(self.agent_timeout_secs.map(Duration::from_secs))
            .with_keys(keys)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let durations = [
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("heartbeat_timeout_secs", self.heartbeat_timeout_secs),
            ("claim_timeout_secs", self.claim_timeout_secs),
            ("task_lease_secs", self.task_lease_secs),
        ];
        for (field, value) in durations {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroDuration,
                    format!("orchestrator.{field} cannot be 0"),
                ));
            }
        }
        if self.agent_timeout_secs == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "orchestrator.agent_timeout_secs cannot be 0; omit it to disable the limit",
            ));
        }
        if self.instances == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroDuration,
                "orchestrator.instances cannot be 0",
            ));
        }

        let interval = self.heartbeat_interval_secs;
        let timeout = self.heartbeat_timeout_secs;
        if interval > 0 && timeout > 0 {
            if timeout < interval * 2 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::HeartbeatTimeoutTooShort,
                    format!(
                        "orchestrator.heartbeat_timeout_secs ({timeout}) must be at least twice heartbeat_interval_secs ({interval})"
                    ),
                ));
            } else if timeout < interval * 3 {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::HeartbeatTimeoutTight,
                    format!(
                        "orchestrator.heartbeat_timeout_secs ({timeout}) is under 3x the interval; a slow heartbeat may trigger a false failover"
                    ),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_domain::Severity;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FileOrchestratorConfig::default().validate().is_empty());
    }

    #[test]
    fn test_to_params() {
        let config = FileOrchestratorConfig {
            kind: OrchestratorKind::Vscode,
            retry_backoff_ms: 250,
            agent_timeout_secs: None,
            ..Default::default()
        };
        let params = config.to_params(QueueKeys::new("test"));
        assert_eq!(params.kind, OrchestratorKind::Vscode);
        assert_eq!(params.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(params.retry_backoff, Duration::from_millis(250));
        assert_eq!(params.agent_timeout, None);
        assert_eq!(params.keys.pending(), "test:tasks:pending");
    }

    #[test]
    fn test_short_heartbeat_timeout_is_error() {
        let config = FileOrchestratorConfig {
            heartbeat_interval_secs: 10,
            heartbeat_timeout_secs: 15,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::HeartbeatTimeoutTooShort);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_tight_heartbeat_timeout_is_warning() {
        let config = FileOrchestratorConfig {
            heartbeat_interval_secs: 10,
            heartbeat_timeout_secs: 25,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_zero_durations_are_errors() {
        let config = FileOrchestratorConfig {
            claim_timeout_secs: 0,
            agent_timeout_secs: Some(0),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == ConfigIssueCode::ZeroDuration));
    }
}
