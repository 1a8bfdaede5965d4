//! Scoring rubric from TOML (`[scoring]` section)
//!
//! ```toml
//! [scoring]
//! gap_penalty = 0.5
//!
//! [scoring.weights]
//! emotional_depth = 0.20
//! somatic_awareness = 0.20
//! research_integration = 0.15
//! practical_application = 0.10
//! cultural_sensitivity = 0.10
//! forensic_accuracy = 0.15
//! academic_rigor = 0.10
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_domain::{ConfigIssue, Dimension, ScoringRubric};

/// Raw scoring configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileScoringConfig {
    /// Weight per dimension; dimensions left out keep their default weight
    pub weights: BTreeMap<Dimension, f64>,
    /// Points taken off practical application per gap finding
    pub gap_penalty: f64,
}

impl Default for FileScoringConfig {
    fn default() -> Self {
        let rubric = ScoringRubric::default();
        Self {
            weights: Dimension::ALL
                .iter()
                .map(|d| (*d, rubric.weight(*d)))
                .collect(),
            gap_penalty: rubric.gap_penalty(),
        }
    }
}

impl FileScoringConfig {
    pub fn to_rubric(&self) -> ScoringRubric {
        self.weights
            .iter()
            .fold(ScoringRubric::default(), |rubric, (dimension, weight)| {
                rubric.with_weight(*dimension, *weight)
            })
            .with_gap_penalty(self.gap_penalty)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.to_rubric().validate()
    }
}
