//! Terminal routing decision.
//!
//! Routing is a pure function of the gate status and the composite score.
//! Gate review overrides the score.

use crate::gate::{CrossValidation, GateStatus};
use serde::{Deserialize, Serialize};

/// Queue a task ends its life in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalQueue {
    Completed,
    Review,
    Failed,
}

impl TerminalQueue {
    pub const ALL: [TerminalQueue; 3] = [
        TerminalQueue::Completed,
        TerminalQueue::Review,
        TerminalQueue::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalQueue::Completed => "completed",
            TerminalQueue::Review => "review",
            TerminalQueue::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TerminalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingReason {
    /// Detector findings the validator did not confirm.
    GateDisagreement { lines: Vec<usize> },
    /// The gate could not run because an agent result was missing.
    GateIncomplete,
    BelowThreshold { score: f64, threshold: f64 },
    Accepted { score: f64 },
}

impl std::fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingReason::GateDisagreement { lines } => {
                let lines: Vec<String> = lines.iter().map(usize::to_string).collect();
                write!(f, "cross-validation disagreement on line(s) {}", lines.join(", "))
            }
            RoutingReason::GateIncomplete => write!(f, "cross-validation incomplete"),
            RoutingReason::BelowThreshold { score, threshold } => {
                write!(f, "score {score:.2} below acceptance threshold {threshold:.2}")
            }
            RoutingReason::Accepted { score } => write!(f, "accepted with score {score:.2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub destination: TerminalQueue,
    pub reason: RoutingReason,
}

/// Thresholds on the 0-10 composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Scores below this go to review.
    pub acceptance_threshold: f64,
    /// Scores at or above this publish vocabulary updates.
    pub publish_threshold: f64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            acceptance_threshold: 8.0,
            publish_threshold: 8.5,
        }
    }
}

impl RoutingPolicy {
    pub fn decide(&self, cross_validation: &CrossValidation, score: f64) -> RoutingDecision {
        let (destination, reason) = match cross_validation.status {
            GateStatus::ReviewRequired => (
                TerminalQueue::Review,
                RoutingReason::GateDisagreement {
                    lines: cross_validation.disagreements.iter().map(|d| d.line).collect(),
                },
            ),
            GateStatus::Incomplete => (TerminalQueue::Review, RoutingReason::GateIncomplete),
            GateStatus::Clear if score < self.acceptance_threshold => (
                TerminalQueue::Review,
                RoutingReason::BelowThreshold {
                    score,
                    threshold: self.acceptance_threshold,
                },
            ),
            GateStatus::Clear => (TerminalQueue::Completed, RoutingReason::Accepted { score }),
        };
        RoutingDecision {
            destination,
            reason,
        }
    }

    /// Publishing is independent of where the task was routed.
    pub fn should_publish(&self, score: f64) -> bool {
        score >= self.publish_threshold
    }
}
