//! Routing thresholds from TOML (`[routing]` section)

use serde::{Deserialize, Serialize};
use swarm_domain::scoring::MAX_SCORE;
use swarm_domain::{ConfigIssue, ConfigIssueCode, RoutingPolicy};

/// Raw routing configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoutingConfig {
    /// Clear tasks scoring below this go to review
    pub acceptance_threshold: f64,
    /// Tasks scoring at or above this broadcast vocabulary updates
    pub publish_threshold: f64,
}

impl Default for FileRoutingConfig {
    fn default() -> Self {
        let policy = RoutingPolicy::default();
        Self {
            acceptance_threshold: policy.acceptance_threshold,
            publish_threshold: policy.publish_threshold,
        }
    }
}

impl FileRoutingConfig {
    pub fn to_policy(&self) -> RoutingPolicy {
        RoutingPolicy {
            acceptance_threshold: self.acceptance_threshold,
            publish_threshold: self.publish_threshold,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("acceptance_threshold", self.acceptance_threshold),
            ("publish_threshold", self.publish_threshold),
        ] {
            if !(0.0..=MAX_SCORE).contains(&value) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ThresholdOutOfRange,
                    format!("routing.{field} ({value}) must be within 0..=10"),
                ));
            }
        }
        if self.publish_threshold < self.acceptance_threshold {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::PublishBelowAcceptance,
                format!(
                    "routing.publish_threshold ({}) is below acceptance_threshold ({}); tasks sent to review may publish vocabulary",
                    self.publish_threshold, self.acceptance_threshold
                ),
            ));
        }
        issues
    }
}
