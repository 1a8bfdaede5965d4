//! Process Task use case
//!
//! Turns one claimed [`Task`] into a [`TaskResult`]: run the waves, apply
//! the cross-validation gate and the scoring rubric, and decide the terminal
//! queue. Nothing here touches the store; committing the result is the
//! orchestrator's job.

use crate::config::EvaluationConfig;
use crate::ports::progress::{NoProgress, WaveProgressNotifier};
use crate::use_cases::run_waves::{RunWavesInput, RunWavesUseCase};
use swarm_domain::core::clock::now;
use swarm_domain::{Task, TaskResult, VocabularyUpdate, collect_updates};
use tracing::info;

/// Use case for analyzing and evaluating one task
#[derive(Clone)]
pub struct ProcessTaskUseCase {
    waves: RunWavesUseCase,
    evaluation: EvaluationConfig,
}

impl ProcessTaskUseCase {
    pub fn new(waves: RunWavesUseCase, evaluation: EvaluationConfig) -> Self {
        Self { waves, evaluation }
    }

    pub fn evaluation(&self) -> &EvaluationConfig {
        &self.evaluation
    }

    pub async fn execute(&self, task: &Task, orchestrator: &str) -> TaskResult {
        self.execute_with_progress(task, orchestrator, &NoProgress)
            .await
    }

    pub async fn execute_with_progress(
        &self,
        task: &Task,
        orchestrator: &str,
        progress: &dyn WaveProgressNotifier,
    ) -> TaskResult {
        let input = RunWavesInput::new(task.id.clone(), task.payload.as_str())
            .with_context(task.context.clone());
        let waves = self.waves.execute_with_progress(input, progress).await;

        let processed_at = now();
        let cross_validation = self.evaluation.gate.cross_validate(&waves, processed_at);
        let composite_score = self.evaluation.rubric.score(&waves);
        let routing = self
            .evaluation
            .routing
            .decide(&cross_validation, composite_score.value);

        info!(
            task_id = %task.id,
            score = composite_score.value,
            gate = cross_validation.status.as_str(),
            destination = %routing.destination,
            "Task evaluated"
        );

        TaskResult {
            task_id: task.id.clone(),
            source: task.source.clone(),
            path: task.path.clone(),
            orchestrator: orchestrator.to_string(),
            processed_at,
            waves,
            cross_validation,
            composite_score,
            routing,
        }
    }

    /// Vocabulary updates to broadcast for `result`, empty below the
    /// publish threshold.
    pub fn vocabulary_updates(&self, result: &TaskResult) -> Vec<VocabularyUpdate> {
        if !self.evaluation.routing.should_publish(result.score()) {
            return Vec::new();
        }
        collect_updates(&result.waves, now())
    }
}
