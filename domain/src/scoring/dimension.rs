use crate::agent::{AgentId, Wave};
use serde::{Deserialize, Serialize};

/// A named axis of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    EmotionalDepth,
    SomaticAwareness,
    ResearchIntegration,
    PracticalApplication,
    CulturalSensitivity,
    ForensicAccuracy,
    AcademicRigor,
}

/// How a dimension's 0-10 value is derived from its source agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    /// Agent confidence scaled to 0-10.
    Confidence,
    /// 10 minus a penalty per finding, floored at 0.
    InverseFindingCount,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::EmotionalDepth,
        Dimension::SomaticAwareness,
        Dimension::ResearchIntegration,
        Dimension::PracticalApplication,
        Dimension::CulturalSensitivity,
        Dimension::ForensicAccuracy,
        Dimension::AcademicRigor,
    ];

    /// The agent whose output feeds this dimension.
    pub fn source_agent(&self) -> AgentId {
        match self {
            Dimension::EmotionalDepth => AgentId::EmotionalIntelligence,
            Dimension::SomaticAwareness => AgentId::SomaticAwareness,
            Dimension::ResearchIntegration => AgentId::ResearchConnector,
            Dimension::PracticalApplication => AgentId::GapsIdentifier,
            Dimension::CulturalSensitivity => AgentId::CulturalContext,
            Dimension::ForensicAccuracy => AgentId::ForensicAccuracy,
            Dimension::AcademicRigor => AgentId::AcademicRigor,
        }
    }

    pub fn source_wave(&self) -> Wave {
        match self {
            Dimension::ForensicAccuracy => Wave::Fidelity,
            Dimension::AcademicRigor => Wave::Validation,
            _ => Wave::Thematic,
        }
    }

    pub fn source(&self) -> DimensionSource {
        match self {
            Dimension::PracticalApplication => DimensionSource::InverseFindingCount,
            _ => DimensionSource::Confidence,
        }
    }

    pub fn default_weight(&self) -> f64 {
        match self {
            Dimension::EmotionalDepth => 0.20,
            Dimension::SomaticAwareness => 0.20,
            Dimension::ResearchIntegration => 0.15,
            Dimension::PracticalApplication => 0.10,
            Dimension::CulturalSensitivity => 0.10,
            Dimension::ForensicAccuracy => 0.15,
            Dimension::AcademicRigor => 0.10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::EmotionalDepth => "emotional_depth",
            Dimension::SomaticAwareness => "somatic_awareness",
            Dimension::ResearchIntegration => "research_integration",
            Dimension::PracticalApplication => "practical_application",
            Dimension::CulturalSensitivity => "cultural_sensitivity",
            Dimension::ForensicAccuracy => "forensic_accuracy",
            Dimension::AcademicRigor => "academic_rigor",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
