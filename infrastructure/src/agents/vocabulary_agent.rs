//! Vocabulary agent
//!
//! The one concrete [`TranscriptAgent`]: sanitize the input, scan it against
//! the profile's vocabulary, and return a signed result. Refused input gives
//! an empty result flagged `input_rejected`; injection attempts are also
//! written to the audit trail as security events.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use swarm_application::{AgentError, AgentRegistry, AuditEvent, AuditLogger, NoAudit, TranscriptAgent};
use swarm_domain::agent::catalog::all_profiles;
use swarm_domain::core::clock::now;
use swarm_domain::{AgentId, AgentProfile, AgentResult, AnalysisContext, sanitize_input, scan_vocabulary};
use tracing::{debug, warn};

/// Catalog agent driven by a declarative vocabulary
pub struct VocabularyAgent {
    profile: AgentProfile,
    audit: Arc<dyn AuditLogger>,
}

impl VocabularyAgent {
    pub fn new(profile: AgentProfile) -> Self {
        Self {
            profile,
            audit: Arc::new(NoAudit),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }
}

#[async_trait]
impl TranscriptAgent for VocabularyAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn analyze(
        &self,
        text: &str,
        context: &AnalysisContext,
    ) -> Result<AgentResult, AgentError> {
        let agent = self.profile.id;
        let wave = self.profile.wave;

        let cleaned = match sanitize_input(text) {
            Ok(cleaned) => cleaned,
            Err(rejection) => {
                warn!(%agent, reason = %rejection, "Input rejected");
                if rejection.is_security_event() {
                    self.audit.log(AuditEvent::new(
                        "security_event",
                        json!({
                            "agent": agent,
                            "tier": self.profile.tier,
                            "reason": rejection.to_string(),
                        }),
                    ));
                }
                return Ok(AgentResult::rejected(agent, wave, rejection.to_string(), now()));
            }
        };

        let outcome = scan_vocabulary(&self.profile, &cleaned);
        debug!(
            %agent,
            findings = outcome.findings.len(),
            patterns = outcome.patterns.len(),
            confidence = outcome.confidence,
            prior_waves = context.prior.waves().count(),
            "Scan complete"
        );

        Ok(AgentResult::new(
            agent,
            wave,
            outcome.findings,
            outcome.patterns,
            outcome.confidence,
            now(),
        ))
    }
}

/// Registry holding a [`VocabularyAgent`] for every catalog agent except
/// those in `disabled`.
pub fn default_registry(disabled: &[AgentId], audit: Arc<dyn AuditLogger>) -> AgentRegistry {
    all_profiles()
        .into_iter()
        .filter(|profile| !disabled.contains(&profile.id))
        .fold(AgentRegistry::new(), |registry, profile| {
            registry.register(VocabularyAgent::new(profile).with_audit(Arc::clone(&audit)))
        })
}
