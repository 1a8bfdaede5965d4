//! Thermopylae gate: cross-validation between the wave-3 risk detector and
//! the legitimacy validator.
//!
//! Every detector finding must be matched by a validator finding on the same
//! line. Unmatched lines are disagreements and force human review whatever
//! the composite score says.

use crate::agent::{AgentId, AgentOutcome, Wave};
use crate::wave::WaveTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The two agents compared by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePair {
    pub detector: AgentId,
    pub validator: AgentId,
    pub wave: Wave,
}

impl Default for GatePair {
    fn default() -> Self {
        Self {
            detector: AgentId::SemanticWeaponizationDetector,
            validator: AgentId::TraumaPatternValidator,
            wave: Wave::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Clear,
    ReviewRequired,
    /// One of the two agents produced no usable result.
    Incomplete,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Clear => "clear",
            GateStatus::ReviewRequired => "review_required",
            GateStatus::Incomplete => "incomplete",
        }
    }
}

/// A detector-flagged line the validator did not confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disagreement {
    pub line: usize,
    /// Detector categories flagged on this line.
    pub detector_concerns: Vec<String>,
    pub requires_review: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub status: GateStatus,
    pub disagreements: Vec<Disagreement>,
    /// Which of the pair was missing, failed or refused its input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<AgentId>,
    pub checked_at: DateTime<Utc>,
}

impl CrossValidation {
    pub fn requires_review(&self) -> bool {
        self.status != GateStatus::Clear
    }
}

impl GatePair {
    pub fn cross_validate(&self, waves: &WaveTable, now: DateTime<Utc>) -> CrossValidation {
        let lookup = |agent| {
            waves
                .get(self.wave, agent)
                .and_then(AgentOutcome::result)
                .filter(|r| r.input_rejected.is_none())
        };
        let detector = lookup(self.detector);
        let validator = lookup(self.validator);

        let (detector, validator) = match (detector, validator) {
            (Some(d), Some(v)) => (d, v),
            (d, v) => {
                let mut missing = Vec::new();
                if d.is_none() {
                    missing.push(self.detector);
                }
                if v.is_none() {
                    missing.push(self.validator);
                }
                return CrossValidation {
                    status: GateStatus::Incomplete,
                    disagreements: Vec::new(),
                    missing,
                    checked_at: now,
                };
            }
        };

        let confirmed: BTreeSet<usize> =
            validator.findings.iter().map(|f| f.line_number).collect();

        let mut unmatched: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for finding in &detector.findings {
            if confirmed.contains(&finding.line_number) {
                continue;
            }
            let concerns = unmatched.entry(finding.line_number).or_default();
            if !concerns.contains(&finding.category) {
                concerns.push(finding.category.clone());
            }
        }

        let disagreements: Vec<Disagreement> = unmatched
            .into_iter()
            .map(|(line, detector_concerns)| Disagreement {
                line,
                detector_concerns,
                requires_review: true,
            })
            .collect();

        CrossValidation {
            status: if disagreements.is_empty() {
                GateStatus::Clear
            } else {
                GateStatus::ReviewRequired
            },
            disagreements,
            missing: Vec::new(),
            checked_at: now,
        }
    }
}
