use super::dimension::{Dimension, DimensionSource};
use crate::config::{ConfigIssue, ConfigIssueCode};
use crate::wave::WaveTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound of the composite score.
pub const MAX_SCORE: f64 = 10.0;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weighted rubric applied to a wave table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRubric {
    weights: BTreeMap<Dimension, f64>,
    /// Points subtracted from practical application per gap finding.
    gap_penalty: f64,
}

impl Default for ScoringRubric {
    fn default() -> Self {
        Self {
            weights: Dimension::ALL
                .iter()
                .map(|d| (*d, d.default_weight()))
                .collect(),
            gap_penalty: 0.5,
        }
    }
}

impl ScoringRubric {
    pub fn with_weight(mut self, dimension: Dimension, weight: f64) -> Self {
        self.weights.insert(dimension, weight);
        self
    }

    pub fn with_gap_penalty(mut self, penalty: f64) -> Self {
        self.gap_penalty = penalty;
        self
    }

    pub fn weight(&self, dimension: Dimension) -> f64 {
        self.weights.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn gap_penalty(&self) -> f64 {
        self.gap_penalty
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (dimension, weight) in &self.weights {
            if *weight < 0.0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::NegativeWeight,
                    format!("scoring weight for {dimension} is negative ({weight})"),
                ));
            }
        }
        if self.gap_penalty < 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NegativeWeight,
                format!("gap_penalty is negative ({})", self.gap_penalty),
            ));
        }

        let sum: f64 = self.weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::WeightsDoNotSumToOne,
                format!("scoring weights sum to {sum:.6}, expected 1.0"),
            ));
        }

        issues
    }

    /// Score a wave table.
    pub fn score(&self, waves: &WaveTable) -> CompositeScore {
        let dimensions: Vec<DimensionScore> = Dimension::ALL
            .iter()
            .map(|dimension| self.score_dimension(*dimension, waves))
            .collect();

        let total: f64 = dimensions.iter().map(|d| d.contribution).sum();

        CompositeScore {
            value: total.clamp(0.0, MAX_SCORE),
            dimensions,
        }
    }

    fn score_dimension(&self, dimension: Dimension, waves: &WaveTable) -> DimensionScore {
        let source = waves
            .result(dimension.source_wave(), dimension.source_agent())
            .filter(|r| r.input_rejected.is_none());

        let value = match (source, dimension.source()) {
            (None, _) => None,
            (Some(result), DimensionSource::Confidence) => {
                Some(result.confidence.clamp(0.0, 1.0) * MAX_SCORE)
            }
            (Some(result), DimensionSource::InverseFindingCount) => {
                let penalty = result.findings.len() as f64 * self.gap_penalty;
                Some((MAX_SCORE - penalty).max(0.0))
            }
        };

        let weight = self.weight(dimension);
        DimensionScore {
            dimension,
            value,
            weight,
            contribution: value.unwrap_or(0.0) * weight,
        }
    }
}

/// One dimension's share of the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// 0-10, or `None` when the source agent produced nothing usable.
    pub value: Option<f64>,
    pub weight: f64,
    pub contribution: f64,
}

/// Weighted composite with its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub value: f64,
    pub dimensions: Vec<DimensionScore>,
}

impl CompositeScore {
    /// Dimensions that fell back to zero because their agent was unavailable.
    pub fn missing_dimensions(&self) -> Vec<Dimension> {
        self.dimensions
            .iter()
            .filter(|d| d.value.is_none())
            .map(|d| d.dimension)
            .collect()
    }

    pub fn breakdown(&self) -> BTreeMap<Dimension, f64> {
        self.dimensions
            .iter()
            .map(|d| (d.dimension, d.contribution))
            .collect()
    }
}
