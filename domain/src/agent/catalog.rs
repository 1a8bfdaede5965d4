//! The built-in agent catalog.
//!
//! Nineteen agents across four waves. Wave membership here is the single
//! source of truth for scheduling; [`agents_in_wave`] preserves catalog order.

use super::profile::AgentProfile;
use super::value_objects::{AgentId, PermissionTier, Wave};

/// Profile for one agent.
pub fn profile(id: AgentId) -> AgentProfile {
    use AgentId::*;
    use PermissionTier as T;
    use Wave::*;

    match id {
        // ==================== Wave 1: Forensic Foundation ====================
        ForensicAccuracy => AgentProfile::new(
            id,
            Fidelity,
            T::FOUNDATION,
            "Character-by-character transcript validation",
        )
        .with_category("verification", &["checksum", "hash", "immutable", "audit_trail"])
        .with_category("accuracy", &["verbatim", "unaltered", "original", "preserved"])
        .with_category("forensic", &["chain_of_custody", "integrity", "validation"]),

        VerbatimPreservation => AgentProfile::new(
            id,
            Fidelity,
            T::FOUNDATION,
            "Maintains exact transcript fidelity",
        )
        .with_category("preservation", &["exact_quote", "hesitation", "pause", "filler"])
        .with_category("fidelity", &["unmodified", "precise", "literal", "accurate"])
        .with_category("markers", &["um", "uh", "silence", "breath"]),

        // ==================== Wave 2: Core Analysis ====================
        EmotionalIntelligence => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Tracks emotional progressions and patterns",
        )
        .with_category("regulation", &["self-soothing", "co-regulation", "dysregulation"])
        .with_category(
            "tolerance",
            &["affect_tolerance", "window_of_tolerance", "hyper/hypoarousal"],
        )
        .with_category(
            "integration",
            &["emotional_integration", "split_affects", "ambivalence"],
        )
        .with_category("progression", &["emotional_arc", "feeling_evolution", "affect_shift"]),

        SomaticAwareness => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Maps body sensations to emotional states",
        )
        .with_category(
            "sensations",
            &["tightness", "heaviness", "warmth", "tingling", "numbness", "constriction"],
        )
        .with_category(
            "processes",
            &["titration", "pendulation", "discharge", "completion", "resourcing"],
        )
        .with_category("awareness", &["interoception", "neuroception", "felt_sense", "body_scan"])
        .with_category(
            "somatic_markers",
            &["breath_pattern", "muscle_tension", "temperature", "movement"],
        ),

        TherapeuticAlliance => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Measures trust and relational dynamics",
        )
        .with_category("trust", &["safety", "rapport", "attunement", "resonance"])
        .with_category(
            "dynamics",
            &["transference", "countertransference", "enactment", "rupture"],
        )
        .with_category("repair", &["reconnection", "restoration", "mending", "healing"])
        .with_category(
            "indicators",
            &["eye_contact", "body_language", "voice_tone", "engagement"],
        ),

        AttachmentDynamics => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Identifies attachment patterns and styles",
        )
        .with_category("styles", &["secure", "anxious", "avoidant", "disorganized"])
        .with_category(
            "patterns",
            &["proximity_seeking", "safe_haven", "secure_base", "separation_distress"],
        )
        .with_category(
            "dynamics",
            &["activation", "deactivation", "hyperactivation", "earned_security"],
        )
        .with_category("markers", &["dependency", "autonomy", "intimacy", "distance"]),

        SafetyTrust => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Detects psychological safety markers",
        )
        .with_category(
            "safety",
            &["containment", "boundaries", "predictability", "stability"],
        )
        .with_category(
            "trust",
            &["reliability", "consistency", "transparency", "vulnerability"],
        )
        .with_category(
            "indicators",
            &["disclosure", "openness", "risk_taking", "exploration"],
        )
        .with_category("threat", &["hypervigilance", "scanning", "bracing", "withdrawal"]),

        UnconsciousCommunication => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Captures non-verbal and implicit patterns",
        )
        .with_category(
            "nonverbal",
            &["pause", "sigh", "gesture", "posture", "facial_expression"],
        )
        .with_category("implicit", &["metaphor", "symbol", "dream", "slip", "association"])
        .with_category("patterns", &["repetition", "omission", "emphasis", "rhythm"])
        .with_category("process", &["enactment", "projection", "unconscious_fantasy"]),

        CulturalContext => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Respects diverse healing traditions",
        )
        .with_category("traditions", &["indigenous", "ancestral", "cultural", "spiritual"])
        .with_category("practices", &["ritual", "ceremony", "community", "collective"])
        .with_category("wisdom", &["elder", "lineage", "transmission", "oral_tradition"])
        .with_category(
            "respect",
            &["cultural_humility", "non_appropriation", "honoring"],
        ),

        ClinicalTerminology => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Maintains dual vocabularies for different audiences",
        )
        .with_category("technical", &["DSM-5", "ICD-11", "diagnosis", "symptomatology"])
        .with_category("accessible", &["struggle", "difficulty", "pattern", "experience"])
        .with_category(
            "bridge",
            &["translation", "explanation", "clarification", "simplification"],
        )
        .with_category(
            "precision",
            &["operationalized", "measurable", "criteria", "threshold"],
        ),

        NarrativeCoherence => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Tracks story structure and flow",
        )
        .with_category("structure", &["beginning", "middle", "end", "arc", "trajectory"])
        .with_category("coherence", &["continuity", "consistency", "integration", "flow"])
        .with_category(
            "disruption",
            &["fragmentation", "dissociation", "gaps", "confusion"],
        )
        .with_category("repair", &["weaving", "connecting", "bridging", "integrating"]),

        ResearchConnector => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Links practice to supporting research",
        )
        .with_category("evidence", &["study", "research", "finding", "data"])
        .with_category(
            "quality",
            &["peer_reviewed", "RCT", "meta_analysis", "systematic_review"],
        )
        .with_category(
            "connection",
            &["supports", "validates", "explains", "corroborates"],
        )
        .with_category(
            "action_research",
            &["practice_based", "inductive", "emergent", "grounded"],
        ),

        GapsIdentifier => AgentProfile::new(
            id,
            Thematic,
            T::ANALYSIS,
            "Finds missing therapeutic elements",
        )
        .with_category("missing", &["absence", "void", "gap", "omission"])
        .with_category("needed", &["required", "essential", "critical", "important"])
        .with_category(
            "patterns",
            &["consistent_absence", "recurring_gap", "systematic_omission"],
        )
        .with_category("opportunity", &["potential", "possibility", "opening", "space"]),

        // ==================== Wave 3: Validation & Security ====================
        AcademicRigor => AgentProfile::new(
            id,
            Validation,
            T::VALIDATION,
            "Ensures academic standards with action research focus",
        )
        .with_category(
            "methodology",
            &["action_research", "inductive", "grounded_theory", "phenomenological"],
        )
        .with_category(
            "rigor",
            &["systematic", "transparent", "replicable", "trustworthy"],
        )
        .with_category(
            "evidence",
            &["triangulation", "saturation", "member_checking", "audit_trail"],
        )
        .with_category(
            "ethics",
            &["beneficence", "non_maleficence", "autonomy", "justice"],
        ),

        ScientificValidation => AgentProfile::new(
            id,
            Validation,
            T::VALIDATION,
            "Validates through practice-to-theory approach",
        )
        .with_category(
            "validation",
            &["empirical", "observable", "measurable", "verifiable"],
        )
        .with_category("methodology", &["inductive", "emergent", "iterative", "reflexive"])
        .with_category(
            "strength",
            &["convergent", "divergent", "explanatory", "predictive"],
        )
        .with_category(
            "practice_based",
            &["clinical_outcomes", "therapeutic_results", "lived_experience"],
        ),

        ActionResearchValidator => AgentProfile::new(
            id,
            Validation,
            T::VALIDATION,
            "Ensures proper action research methodology",
        )
        .with_category(
            "action_research",
            &["practice_to_theory", "wisdom_validating", "outcome_based"],
        )
        .with_category(
            "inductive",
            &["pattern_emergence", "bottom_up", "grounded", "emergent"],
        )
        .with_category(
            "systematic",
            &["documentation", "observation", "reflection", "iteration"],
        )
        .with_category(
            "ethics",
            &["participant_centered", "collaborative", "transformative"],
        ),

        SemanticWeaponizationDetector => AgentProfile::new(
            id,
            Validation,
            T::VALIDATION,
            "Detects attacks hidden in therapeutic language",
        )
        .with_category(
            "attack_patterns",
            &["command_syntax", "directive_language", "injection_attempt"],
        )
        .with_category(
            "therapeutic_overlap",
            &["ignore_pain", "ignore_signals", "disregard_feelings"],
        )
        .with_category(
            "detection",
            &["context_analysis", "syntax_checking", "pattern_matching"],
        )
        .with_category(
            "thermopylae",
            &["gateway", "vulnerability", "dual_use", "boundary"],
        ),

        TraumaPatternValidator => AgentProfile::new(
            id,
            Validation,
            T::VALIDATION,
            "Confirms legitimate therapeutic content",
        )
        .with_category(
            "trauma_patterns",
            &["avoidance", "intrusion", "hyperarousal", "dissociation"],
        )
        .with_category(
            "therapeutic",
            &["processing", "integration", "resolution", "healing"],
        )
        .with_category(
            "validation",
            &["authentic", "legitimate", "clinical", "therapeutic"],
        )
        .with_category(
            "markers",
            &["narrative_flow", "emotional_congruence", "somatic_alignment"],
        ),

        // ==================== Wave 4: Synthesis ====================
        IntegrationSynthesis => AgentProfile::new(
            id,
            Synthesis,
            T::VALIDATION,
            "Combines outputs from all agents",
        )
        .with_category("integration", &["synthesis", "combination", "weaving", "merging"])
        .with_category(
            "holistic",
            &["comprehensive", "complete", "unified", "integrated"],
        )
        .with_category("patterns", &["convergence", "divergence", "themes", "threads"])
        .with_category(
            "output",
            &["summary", "findings", "insights", "recommendations"],
        ),
    }
}

/// All profiles in catalog order.
pub fn all_profiles() -> Vec<AgentProfile> {
    AgentId::ALL.iter().copied().map(profile).collect()
}

/// Agents scheduled in `wave`, in catalog order.
pub fn agents_in_wave(wave: Wave) -> Vec<AgentId> {
    AgentId::ALL
        .iter()
        .copied()
        .filter(|id| profile(*id).wave == wave)
        .collect()
}
