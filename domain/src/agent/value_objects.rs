//! Agent domain value objects.
//!
//! # Identifiers
//! - [`AgentId`] - the closed set of analysis agents known at compile time
//!
//! # Scheduling
//! - [`Wave`] - the ordered tier an agent runs in
//! - [`PermissionTier`] - the security tier an agent is granted

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of an analysis agent.
///
/// The set is closed: adding an agent means adding a variant here and an
/// entry in [`crate::agent::catalog`]. Serialized as the snake_case name used
/// in queue records and context keys (e.g. `somatic_awareness`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    // Wave 1
    ForensicAccuracy,
    VerbatimPreservation,
    // Wave 2
    EmotionalIntelligence,
    SomaticAwareness,
    TherapeuticAlliance,
    AttachmentDynamics,
    SafetyTrust,
    UnconsciousCommunication,
    CulturalContext,
    ClinicalTerminology,
    NarrativeCoherence,
    ResearchConnector,
    GapsIdentifier,
    // Wave 3
    AcademicRigor,
    ScientificValidation,
    ActionResearchValidator,
    SemanticWeaponizationDetector,
    TraumaPatternValidator,
    // Wave 4
    IntegrationSynthesis,
}

impl AgentId {
    /// Every agent, in catalog order.
    pub const ALL: [AgentId; 19] = [
        AgentId::ForensicAccuracy,
        AgentId::VerbatimPreservation,
        AgentId::EmotionalIntelligence,
        AgentId::SomaticAwareness,
        AgentId::TherapeuticAlliance,
        AgentId::AttachmentDynamics,
        AgentId::SafetyTrust,
        AgentId::UnconsciousCommunication,
        AgentId::CulturalContext,
        AgentId::ClinicalTerminology,
        AgentId::NarrativeCoherence,
        AgentId::ResearchConnector,
        AgentId::GapsIdentifier,
        AgentId::AcademicRigor,
        AgentId::ScientificValidation,
        AgentId::ActionResearchValidator,
        AgentId::SemanticWeaponizationDetector,
        AgentId::TraumaPatternValidator,
        AgentId::IntegrationSynthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::ForensicAccuracy => "forensic_accuracy",
            AgentId::VerbatimPreservation => "verbatim_preservation",
            AgentId::EmotionalIntelligence => "emotional_intelligence",
            AgentId::SomaticAwareness => "somatic_awareness",
            AgentId::TherapeuticAlliance => "therapeutic_alliance",
            AgentId::AttachmentDynamics => "attachment_dynamics",
            AgentId::SafetyTrust => "safety_trust",
            AgentId::UnconsciousCommunication => "unconscious_communication",
            AgentId::CulturalContext => "cultural_context",
            AgentId::ClinicalTerminology => "clinical_terminology",
            AgentId::NarrativeCoherence => "narrative_coherence",
            AgentId::ResearchConnector => "research_connector",
            AgentId::GapsIdentifier => "gaps_identifier",
            AgentId::AcademicRigor => "academic_rigor",
            AgentId::ScientificValidation => "scientific_validation",
            AgentId::ActionResearchValidator => "action_research_validator",
            AgentId::SemanticWeaponizationDetector => "semantic_weaponization_detector",
            AgentId::TraumaPatternValidator => "trauma_pattern_validator",
            AgentId::IntegrationSynthesis => "integration_synthesis",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        AgentId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| DomainError::UnknownAgent(s.to_string()))
    }
}

/// An ordered tier of agents executed as a barrier-synchronized group.
///
/// Serialized as its number (1-4) so that wave tables read naturally in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Wave {
    /// Transcript-fidelity checks
    Fidelity,
    /// Parallel thematic/clinical analyses
    Thematic,
    /// Validation and security checks
    Validation,
    /// Synthesis across all prior outputs
    Synthesis,
}

impl Wave {
    /// All waves in execution order.
    pub const ORDERED: [Wave; 4] = [
        Wave::Fidelity,
        Wave::Thematic,
        Wave::Validation,
        Wave::Synthesis,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Wave::Fidelity => 1,
            Wave::Thematic => 2,
            Wave::Validation => 3,
            Wave::Synthesis => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Wave::Fidelity => "fidelity",
            Wave::Thematic => "thematic",
            Wave::Validation => "validation",
            Wave::Synthesis => "synthesis",
        }
    }
}

impl TryFrom<u8> for Wave {
    type Error = DomainError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Wave::Fidelity),
            2 => Ok(Wave::Thematic),
            3 => Ok(Wave::Validation),
            4 => Ok(Wave::Synthesis),
            other => Err(DomainError::InvalidWave(other)),
        }
    }
}

impl From<Wave> for u8 {
    fn from(wave: Wave) -> Self {
        wave.number()
    }
}

impl std::fmt::Display for Wave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wave {}", self.number())
    }
}

/// Security tier granted to an agent (1 = least privileged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PermissionTier(u8);

impl PermissionTier {
    pub const FOUNDATION: PermissionTier = PermissionTier(1);
    pub const ANALYSIS: PermissionTier = PermissionTier(2);
    pub const VALIDATION: PermissionTier = PermissionTier(3);

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PermissionTier {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&n) {
            Ok(PermissionTier(n))
        } else {
            Err(format!("permission tier must be 1-3, got {n}"))
        }
    }
}

impl From<PermissionTier> for u8 {
    fn from(tier: PermissionTier) -> Self {
        tier.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_round_trips_through_str() {
        for id in AgentId::ALL {
            assert_eq!(id.as_str().parse::<AgentId>().unwrap(), id);
        }
    }

    #[test]
    fn test_agent_id_parse_is_lenient_on_case_and_whitespace() {
        assert_eq!(
            " Somatic_Awareness ".parse::<AgentId>().unwrap(),
            AgentId::SomaticAwareness
        );
        assert!("somatic".parse::<AgentId>().is_err());
    }

    #[test]
    fn test_agent_id_serializes_as_snake_case() {
        let json = serde_json::to_string(&AgentId::SemanticWeaponizationDetector).unwrap();
        assert_eq!(json, "\"semantic_weaponization_detector\"");
    }

    #[test]
    fn test_wave_order_and_numbers() {
        let numbers: Vec<u8> = Wave::ORDERED.iter().map(Wave::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(Wave::Fidelity < Wave::Synthesis);
    }

    #[test]
    fn test_wave_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Wave::Validation).unwrap(), "3");
        let wave: Wave = serde_json::from_str("2").unwrap();
        assert_eq!(wave, Wave::Thematic);
        assert!(serde_json::from_str::<Wave>("5").is_err());
    }

    #[test]
    fn test_permission_tier_bounds() {
        assert!(PermissionTier::try_from(0).is_err());
        assert!(PermissionTier::try_from(4).is_err());
        assert_eq!(PermissionTier::try_from(2).unwrap(), PermissionTier::ANALYSIS);
    }
}
