//! Run Waves use case
//!
//! The wave scheduler. Runs the four waves strictly in order; agents within a
//! wave run concurrently and all of them finish (or fail) before the next
//! wave starts. Each wave sees a snapshot of the results of earlier waves
//! only, so agents in the same wave never observe each other.

use crate::ports::agent::{AgentError, TranscriptAgent};
use crate::ports::progress::{NoProgress, WaveProgressNotifier};
use crate::registry::AgentRegistry;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::{AgentId, AgentOutcome, AgentResult, AnalysisContext, TaskId, Wave, WaveTable};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Input for the RunWaves use case
#[derive(Debug, Clone)]
pub struct RunWavesInput {
    pub task_id: TaskId,
    pub text: Arc<str>,
    pub context: Map<String, Value>,
}

impl RunWavesInput {
    pub fn new(task_id: TaskId, text: impl Into<Arc<str>>) -> Self {
        Self {
            task_id,
            text: text.into(),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

/// Use case for running every wave over one transcript
#[derive(Clone)]
pub struct RunWavesUseCase {
    registry: Arc<AgentRegistry>,
    agent_timeout: Option<Duration>,
}

impl RunWavesUseCase {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            agent_timeout: None,
        }
    }

    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunWavesInput) -> WaveTable {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunWavesInput,
        progress: &dyn WaveProgressNotifier,
    ) -> WaveTable {
        let mut table = WaveTable::new();

        for wave in Wave::ORDERED {
            let context = Arc::new(AnalysisContext::new(input.context.clone(), table.clone()));
            let outcomes = self.run_wave(wave, &input, context, progress).await;

            // Merged only after the whole wave is done
            table.mark_wave(wave);
            for outcome in outcomes {
                table.insert(wave, outcome);
            }
        }

        info!(
            task_id = %input.task_id,
            outcomes = table.outcome_count(),
            failed = table.failed_count(),
            "All waves complete"
        );
        table
    }

    async fn run_wave(
        &self,
        wave: Wave,
        input: &RunWavesInput,
        context: Arc<AnalysisContext>,
        progress: &dyn WaveProgressNotifier,
    ) -> Vec<AgentOutcome> {
        for missing in self.registry.missing_in_wave(wave) {
            warn!(
                task_id = %input.task_id,
                agent = %missing,
                %wave,
                "Agent not loaded, skipping"
            );
        }

        let members = self.registry.loaded_in_wave(wave);
        debug!(task_id = %input.task_id, %wave, agents = members.len(), "Starting wave");
        progress.on_wave_start(&input.task_id, wave, members.len());

        let mut join_set = JoinSet::new();
        // Agents that have not reported yet; any left after the join loop
        // lost their task and still get a failed outcome.
        let mut unreported = BTreeSet::new();

        for id in members {
            let Some(agent) = self.registry.get(id) else {
                continue;
            };
            let text = Arc::clone(&input.text);
            let context = Arc::clone(&context);
            let timeout = self.agent_timeout;

            unreported.insert(id);
            join_set.spawn(async move {
                let result = Self::invoke(agent.as_ref(), &text, &context, timeout).await;
                (id, result)
            });
        }

        let mut outcomes = Vec::new();
        let mut join_errors = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            if let Ok((agent, _)) = &joined {
                unreported.remove(agent);
            }
            match joined {
                Ok((agent, Ok(result))) => {
                    debug!(
                        task_id = %input.task_id,
                        %agent,
                        findings = result.findings.len(),
                        confidence = result.confidence,
                        "Agent completed"
                    );
                    progress.on_agent_complete(&input.task_id, wave, agent, true);
                    outcomes.push(AgentOutcome::Completed(result));
                }
                Ok((agent, Err(e))) => {
                    warn!(task_id = %input.task_id, %agent, error = %e, "Agent failed");
                    progress.on_agent_complete(&input.task_id, wave, agent, false);
                    outcomes.push(AgentOutcome::Failed {
                        agent,
                        wave,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(task_id = %input.task_id, %wave, error = %e, "Agent task join error");
                    join_errors.push(e.to_string());
                }
            }
        }

        // With a single lost task its join error is known to be that agent's
        let error = match join_errors.as_slice() {
            [only] if unreported.len() == 1 => only.clone(),
            _ => "agent task ended without reporting".to_string(),
        };
        for agent in unreported {
            progress.on_agent_complete(&input.task_id, wave, agent, false);
            outcomes.push(AgentOutcome::Failed {
                agent,
                wave,
                error: error.clone(),
            });
        }

        progress.on_wave_complete(&input.task_id, wave);
        outcomes
    }

    /// Run one agent, converting panics, timeouts and bad results to errors.
    async fn invoke(
        agent: &dyn TranscriptAgent,
        text: &str,
        context: &AnalysisContext,
        timeout: Option<Duration>,
    ) -> Result<AgentResult, AgentError> {
        let call = AssertUnwindSafe(agent.analyze(text, context)).catch_unwind();

        let caught = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AgentError::Timeout(limit))?,
            None => call.await,
        };

        let result = caught.map_err(|panic| AgentError::Panicked(panic_message(panic.as_ref())))??;
        Self::check_result(agent.id(), agent.wave(), result)
    }

    fn check_result(
        expected: AgentId,
        wave: Wave,
        result: AgentResult,
    ) -> Result<AgentResult, AgentError> {
        if result.agent != expected || result.wave != wave {
            return Err(AgentError::Integrity(format!(
                "expected a {} result for {}, got {} for {}",
                wave, expected, result.wave, result.agent
            )));
        }
        if !result.verify_signature() {
            return Err(AgentError::Integrity("signature mismatch".to_string()));
        }
        Ok(result)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use swarm_domain::agent::catalog::profile;
    use swarm_domain::core::clock::now;
    use swarm_domain::{AgentProfile, context_key};

    // ==================== Test Mocks ====================

    /// Records the context keys it was shown and returns an empty result.
    struct RecordingAgent {
        profile: AgentProfile,
        seen: Arc<Mutex<Vec<(AgentId, Vec<String>)>>>,
    }

    #[async_trait]
    impl TranscriptAgent for RecordingAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        async fn analyze(
            &self,
            _text: &str,
            context: &AnalysisContext,
        ) -> Result<AgentResult, AgentError> {
            self.seen
                .lock()
                .unwrap()
                .push((self.profile.id, context.prior.context_keys()));
            Ok(AgentResult::new(
                self.profile.id,
                self.profile.wave,
                vec![],
                vec![],
                0.5,
                now(),
            ))
        }
    }

    enum Misbehavior {
        Fail,
        Panic,
        Hang,
        WrongAgent,
    }

    struct BrokenAgent {
        profile: AgentProfile,
        how: Misbehavior,
    }

    #[async_trait]
    impl TranscriptAgent for BrokenAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        async fn analyze(
            &self,
            _text: &str,
            _context: &AnalysisContext,
        ) -> Result<AgentResult, AgentError> {
            match self.how {
                Misbehavior::Fail => Err(AgentError::AnalysisFailed("vocabulary missing".into())),
                Misbehavior::Panic => panic!("agent exploded"),
                Misbehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    unreachable!()
                }
                Misbehavior::WrongAgent => Ok(AgentResult::new(
                    AgentId::IntegrationSynthesis,
                    Wave::Synthesis,
                    vec![],
                    vec![],
                    1.0,
                    now(),
                )),
            }
        }
    }

    /// Analyzes fine, then panics the next time its profile is read, which
    /// happens in the spawned task outside the agent call itself.
    struct VanishingAgent {
        profile: AgentProfile,
        analyzed: AtomicBool,
    }

    #[async_trait]
    impl TranscriptAgent for VanishingAgent {
        fn profile(&self) -> &AgentProfile {
            if self.analyzed.load(Ordering::SeqCst) {
                panic!("profile lost");
            }
            &self.profile
        }

        async fn analyze(
            &self,
            _text: &str,
            _context: &AnalysisContext,
        ) -> Result<AgentResult, AgentError> {
            self.analyzed.store(true, Ordering::SeqCst);
            Ok(AgentResult::new(
                self.profile.id,
                self.profile.wave,
                vec![],
                vec![],
                0.5,
                now(),
            ))
        }
    }

    fn full_registry(seen: &Arc<Mutex<Vec<(AgentId, Vec<String>)>>>) -> AgentRegistry {
        AgentId::ALL
            .iter()
            .fold(AgentRegistry::new(), |registry, id| {
                registry.register(RecordingAgent {
                    profile: profile(*id),
                    seen: Arc::clone(seen),
                })
            })
    }

    fn input() -> RunWavesInput {
        RunWavesInput::new(TaskId::from("t-1"), "Client: hello")
    }

    #[tokio::test]
    async fn test_all_waves_run_and_fill_table() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let use_case = RunWavesUseCase::new(Arc::new(full_registry(&seen)));

        let table = use_case.execute(input()).await;

        assert_eq!(table.outcome_count(), 19);
        assert_eq!(table.failed_count(), 0);
        assert_eq!(table.wave(Wave::Thematic).unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_context_contains_prior_waves_and_nothing_later() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let use_case = RunWavesUseCase::new(Arc::new(full_registry(&seen)));
        use_case.execute(input()).await;

        let seen = seen.lock().unwrap();
        for (agent, keys) in seen.iter() {
            let wave = profile(*agent).wave;
            for earlier in Wave::ORDERED.iter().filter(|w| **w < wave) {
                for member in swarm_domain::agent::catalog::agents_in_wave(*earlier) {
                    assert!(
                        keys.contains(&context_key(*earlier, member)),
                        "{agent} is missing {member}"
                    );
                }
            }
            let own_prefix = format!("wave_{}_", wave.number());
            assert!(
                keys.iter().all(|k| {
                    let n: u8 = k[5..6].parse().unwrap();
                    n < wave.number() && !k.starts_with(&own_prefix)
                }),
                "{agent} saw same-wave or later keys: {keys:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_agent_is_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = full_registry(&seen).without(AgentId::SomaticAwareness);
        let use_case = RunWavesUseCase::new(Arc::new(registry));

        let table = use_case.execute(input()).await;

        assert_eq!(table.outcome_count(), 18);
        assert!(table.get(Wave::Thematic, AgentId::SomaticAwareness).is_none());
    }

    #[tokio::test]
    async fn test_empty_registry_still_runs_all_waves() {
        let use_case = RunWavesUseCase::new(Arc::new(AgentRegistry::new()));
        let table = use_case.execute(input()).await;
        assert_eq!(table.outcome_count(), 0);
        assert_eq!(table.waves().count(), 4);
    }

    async fn run_broken(how: Misbehavior) -> AgentOutcome {
        let registry = AgentRegistry::new().register(BrokenAgent {
            profile: profile(AgentId::GapsIdentifier),
            how,
        });
        let use_case = RunWavesUseCase::new(Arc::new(registry))
            .with_agent_timeout(Some(Duration::from_millis(50)));
        let table = use_case.execute(input()).await;
        table
            .get(Wave::Thematic, AgentId::GapsIdentifier)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_agent_error_is_recorded_not_propagated() {
        let outcome = run_broken(Misbehavior::Fail).await;
        match outcome {
            AgentOutcome::Failed { error, .. } => assert!(error.contains("vocabulary missing")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_agent_panic_is_recorded() {
        let outcome = run_broken(Misbehavior::Panic).await;
        match outcome {
            AgentOutcome::Failed { error, .. } => assert!(error.contains("agent exploded")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_agent_timeout_is_recorded() {
        let outcome = run_broken(Misbehavior::Hang).await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn test_result_for_wrong_agent_is_rejected() {
        let outcome = run_broken(Misbehavior::WrongAgent).await;
        match outcome {
            AgentOutcome::Failed { error, .. } => assert!(error.contains("Integrity")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lost_agent_task_is_recorded_as_failed() {
        let registry = AgentRegistry::new()
            .register(VanishingAgent {
                profile: profile(AgentId::GapsIdentifier),
                analyzed: AtomicBool::new(false),
            })
            .register(BrokenAgent {
                profile: profile(AgentId::SomaticAwareness),
                how: Misbehavior::Fail,
            });
        let use_case = RunWavesUseCase::new(Arc::new(registry));

        let table = use_case.execute(input()).await;

        assert_eq!(table.wave(Wave::Thematic).unwrap().len(), 2);
        match table.get(Wave::Thematic, AgentId::GapsIdentifier).unwrap() {
            AgentOutcome::Failed { agent, wave, error } => {
                assert_eq!(*agent, AgentId::GapsIdentifier);
                assert_eq!(*wave, Wave::Thematic);
                assert!(error.contains("panicked"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
