//! Evaluation policy applied after the waves finish.

use swarm_domain::{GatePair, RoutingPolicy, ScoringRubric};

/// Scoring rubric, cross-validation pair and routing thresholds.
#[derive(Debug, Clone, Default)]
pub struct EvaluationConfig {
    pub rubric: ScoringRubric,
    pub gate: GatePair,
    pub routing: RoutingPolicy,
}

impl EvaluationConfig {
    pub fn with_rubric(mut self, rubric: ScoringRubric) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }
}
