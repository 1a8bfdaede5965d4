//! Orchestrator use case
//!
//! One orchestrator instance claims tasks from the shared pending queue,
//! processes them, and commits each result to exactly one terminal queue.
//! Any number of instances may share a store.
//!
//! # Ownership protocol
//!
//! - **Claim**: an atomic move from `pending` to this instance's private
//!   processing list. A task is owned by at most one instance at a time,
//!   and ownership is visible in the store.
//! - **Commit**: remove from the processing list and push the record to the
//!   terminal queue in one store operation. If the removal finds nothing
//!   (the task was reclaimed meanwhile) no record is pushed.
//! - **Heartbeat**: the registration hash and an expiring lease key are
//!   refreshed every `heartbeat_interval`.
//! - **Failover**: a peer whose lease has expired and whose last heartbeat is
//!   older than `heartbeat_timeout` is dead. Its processing list is drained
//!   back to `pending` one item at a time, then it leaves the active set and
//!   its registration is deleted.
//!   Draining an already empty list is a no-op, so two instances declaring
//!   the same peer dead cannot duplicate a task.
//! - **Lease sweep**: every claim is timestamped. A claim older than
//!   `task_lease` is requeued even if its owner is alive but hung.
//! - **Store errors**: connection loss and timeouts are retried after
//!   `retry_backoff`. Any other store error stops the instance.

use crate::config::OrchestratorParams;
use crate::ports::audit::{AuditEvent, AuditLogger, NoAudit};
use crate::ports::progress::{NoProgress, WaveProgressNotifier};
use crate::ports::queue_store::{QueueStore, StoreError};
use crate::use_cases::process_task::ProcessTaskUseCase;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::core::clock::{format_timestamp, now, parse_timestamp};
use swarm_domain::util::preview;
use swarm_domain::{
    FailureRecord, InstanceId, InstanceStatus, OrchestratorRegistration, QueueKeys, Task, TaskId,
    TerminalQueue, TerminalRecord, VocabularyBroadcast,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const PREVIEW_BYTES: usize = 200;

/// Errors that can occur while orchestrating
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Whether the task loop should back off and try again.
    pub fn is_transient(&self) -> bool {
        match self {
            OrchestratorError::Store(e) => e.is_transient(),
            OrchestratorError::Serialization(_) => false,
        }
    }
}

/// What happened to one claimed queue item.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Analyzed and committed to a terminal queue.
    Routed {
        task_id: TaskId,
        destination: TerminalQueue,
        score: f64,
    },
    /// Unreadable item, committed to the failed queue.
    Failed {
        task_id: Option<TaskId>,
        error: String,
    },
    /// Ownership was lost before commit; the result was discarded.
    Reclaimed { task_id: TaskId },
}

/// Work done by one maintenance pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    /// Dead peers and how many tasks were recovered from each.
    pub failovers: Vec<(InstanceId, usize)>,
    /// Tasks requeued because their claim outlived the lease.
    pub reclaimed: usize,
}

/// Only the id is needed to index a claim.
#[derive(Deserialize)]
struct ClaimProbe {
    id: TaskId,
}

fn claim_key(raw: &str) -> Option<TaskId> {
    serde_json::from_str::<ClaimProbe>(raw).ok().map(|p| p.id)
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

/// One orchestrator instance
pub struct Orchestrator<S: QueueStore + 'static> {
    id: InstanceId,
    store: Arc<S>,
    process: ProcessTaskUseCase,
    params: OrchestratorParams,
    started_at: DateTime<Utc>,
    audit: Arc<dyn AuditLogger>,
    progress: Arc<dyn WaveProgressNotifier>,
}

impl<S: QueueStore + 'static> Orchestrator<S> {
    pub fn new(store: Arc<S>, process: ProcessTaskUseCase, params: OrchestratorParams) -> Self {
        Self {
            id: InstanceId::generate(params.kind),
            store,
            process,
            params,
            started_at: now(),
            audit: Arc::new(NoAudit),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_id(mut self, id: InstanceId) -> Self {
        self.id = id;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn WaveProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    fn keys(&self) -> &QueueKeys {
        &self.params.keys
    }

    fn processing(&self) -> String {
        self.keys().processing(self.id.as_str())
    }

    // ==================== Registration & Heartbeat ====================

    fn registration(&self) -> OrchestratorRegistration {
        let mut registration =
            OrchestratorRegistration::new(self.id.clone(), self.params.kind, self.started_at);
        registration.last_heartbeat = now();
        registration
    }

    pub async fn register(&self) -> Result<(), OrchestratorError> {
        let registration = self.registration();
        let keys = self.keys();

        // Hash before set membership, so peers never see a member without a record
        self.store
            .hash_set(&keys.registration(self.id.as_str()), &registration.to_fields())
            .await?;
        self.store
            .set_add(&keys.active_set(), self.id.as_str())
            .await?;
        self.refresh_lease().await?;

        info!(instance = %self.id, kind = %self.params.kind, "Orchestrator registered");
        self.audit.log(AuditEvent::new(
            "orchestrator_registered",
            json!({ "instance": self.id, "kind": self.params.kind }),
        ));
        Ok(())
    }

    /// Rewrites the whole registration, so a record deleted by a peer that
    /// wrongly declared this instance dead comes back complete.
    pub async fn heartbeat(&self) -> Result<(), OrchestratorError> {
        self.store
            .hash_set(
                &self.keys().registration(self.id.as_str()),
                &self.registration().to_fields(),
            )
            .await?;
        // Rejoin if a peer wrongly declared this instance dead
        if self
            .store
            .set_add(&self.keys().active_set(), self.id.as_str())
            .await?
        {
            warn!(instance = %self.id, "Re-registered after being dropped from the active set");
        }
        self.refresh_lease().await?;
        debug!(instance = %self.id, "Heartbeat");
        Ok(())
    }

    async fn refresh_lease(&self) -> Result<(), OrchestratorError> {
        self.store
            .set_with_ttl(
                &self.keys().lease(self.id.as_str()),
                &format_timestamp(&now()),
                self.params.heartbeat_timeout,
            )
            .await?;
        Ok(())
    }

    // ==================== Failover ====================

    /// Scan every other registered instance and recover the dead ones.
    pub async fn check_peer_health(&self) -> Result<Vec<(InstanceId, usize)>, OrchestratorError> {
        let keys = self.keys();
        let timeout = to_chrono(self.params.heartbeat_timeout);
        let members = self.store.set_members(&keys.active_set()).await?;

        let mut recovered = Vec::new();
        for member in members {
            if member == self.id.as_str() {
                continue;
            }
            if self.store.get(&keys.lease(&member)).await?.is_some() {
                continue;
            }

            let peer = InstanceId::new(member);
            let fields = self
                .store
                .hash_get_all(&keys.registration(peer.as_str()))
                .await?;

            let dead = if fields.is_empty() {
                true
            } else {
                match OrchestratorRegistration::from_fields(peer.clone(), &fields) {
                    Ok(registration) => {
                        registration.status == InstanceStatus::Stopped
                            || registration.is_stale(now(), timeout)
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Unreadable registration, treating peer as dead");
                        true
                    }
                }
            };

            if dead {
                let moved = self.handle_peer_failure(&peer).await?;
                recovered.push((peer, moved));
            }
        }
        Ok(recovered)
    }

    /// Drain a dead peer's processing list back to pending and deregister it.
    ///
    /// Safe to call concurrently from several instances for the same peer.
    pub async fn handle_peer_failure(&self, peer: &InstanceId) -> Result<usize, OrchestratorError> {
        let keys = self.keys();
        let processing = keys.processing(peer.as_str());
        let pending = keys.pending();

        warn!(instance = %self.id, peer = %peer, "Peer heartbeat expired, recovering its tasks");

        let mut moved = 0;
        while let Some(item) = self.store.move_one(&processing, &pending).await? {
            moved += 1;
            debug!(peer = %peer, item = %preview(&item, 80), "Recovered task");
        }

        self.store.delete(&keys.claims(peer.as_str())).await?;
        let removed = self
            .store
            .set_remove(&keys.active_set(), peer.as_str())
            .await?;
        self.store.delete(&keys.registration(peer.as_str())).await?;

        if moved > 0 || removed {
            info!(peer = %peer, recovered = moved, "Peer failover complete");
            self.audit.log(AuditEvent::new(
                "peer_failover",
                json!({ "instance": self.id, "peer": peer, "recovered": moved }),
            ));
        }
        Ok(moved)
    }

    /// Requeue every claim, on any instance, older than the task lease.
    pub async fn sweep_stale_claims(&self) -> Result<usize, OrchestratorError> {
        let keys = self.keys();
        let lease = to_chrono(self.params.task_lease);
        let pending = keys.pending();
        let checked_at = now();

        let mut reclaimed = 0;
        for owner in self.store.set_members(&keys.active_set()).await? {
            let claims_key = keys.claims(&owner);
            let claims = self.store.hash_get_all(&claims_key).await?;

            let stale: Vec<String> = claims
                .into_iter()
                .filter(|(_, claimed_at)| {
                    parse_timestamp(claimed_at)
                        .map(|at| checked_at - at > lease)
                        .unwrap_or(true)
                })
                .map(|(task_id, _)| task_id)
                .collect();
            if stale.is_empty() {
                continue;
            }

            let processing = keys.processing(&owner);
            let items = self.store.range(&processing).await?;

            for task_id in stale {
                let item = items
                    .iter()
                    .find(|raw| claim_key(raw).is_some_and(|id| id.as_str() == task_id));
                if let Some(raw) = item
                    && self.store.requeue(&processing, raw, &pending).await?
                {
                    reclaimed += 1;
                    warn!(owner = %owner, task_id = %task_id, "Claim outlived its lease, task requeued");
                    self.audit.log(AuditEvent::new(
                        "lease_reclaimed",
                        json!({ "instance": self.id, "owner": owner, "task_id": task_id }),
                    ));
                }
                self.store.hash_delete(&claims_key, &task_id).await?;
            }
        }
        Ok(reclaimed)
    }

    /// Heartbeat, peer scan and lease sweep. Errors are logged, not returned.
    pub async fn maintenance_tick(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        if let Err(e) = self.heartbeat().await {
            warn!(instance = %self.id, error = %e, "Heartbeat failed");
        }
        match self.check_peer_health().await {
            Ok(failovers) => report.failovers = failovers,
            Err(e) => warn!(instance = %self.id, error = %e, "Peer health check failed"),
        }
        match self.sweep_stale_claims().await {
            Ok(n) => report.reclaimed = n,
            Err(e) => warn!(instance = %self.id, error = %e, "Lease sweep failed"),
        }
        report
    }

    // ==================== Claim & Process ====================

    /// Atomically move one task from pending to this instance's processing list.
    pub async fn claim_next(&self) -> Result<Option<String>, OrchestratorError> {
        let raw = self
            .store
            .blocking_move(
                &self.keys().pending(),
                &self.processing(),
                self.params.claim_timeout,
            )
            .await?;

        if let Some(raw) = &raw
            && let Some(task_id) = claim_key(raw)
        {
            let claim = [(task_id.to_string(), format_timestamp(&now()))];
            if let Err(e) = self
                .store
                .hash_set(&self.keys().claims(self.id.as_str()), &claim)
                .await
            {
                // The task is still owned and will be processed; only lease
                // recovery is lost for it.
                warn!(task_id = %task_id, error = %e, "Failed to record claim time");
            }
            debug!(instance = %self.id, task_id = %task_id, "Task claimed");
            self.audit.log(AuditEvent::new(
                "task_claimed",
                json!({ "instance": self.id, "task_id": task_id }),
            ));
        }
        Ok(raw)
    }

    /// Process an item this instance has claimed and commit the outcome.
    pub async fn process_claimed(&self, raw: &str) -> Result<ProcessOutcome, OrchestratorError> {
        let task: Task = match serde_json::from_str(raw) {
            Ok(task) => task,
            Err(e) => return self.fail_unreadable(raw, e).await,
        };

        info!(instance = %self.id, task_id = %task.id, source = %task.source, "Processing task");

        let result = self
            .process
            .execute_with_progress(&task, self.id.as_str(), self.progress.as_ref())
            .await;
        let destination = result.destination();
        let score = result.score();
        let reason = result.routing.reason.to_string();

        let record = TerminalRecord::Analyzed(result);
        let payload = serde_json::to_string(&record)?;

        let committed = self
            .store
            .commit(
                &self.processing(),
                raw,
                &self.keys().terminal(destination),
                &payload,
            )
            .await?;
        self.release_claim(&task.id).await;

        if !committed {
            warn!(
                instance = %self.id,
                task_id = %task.id,
                "Task was reclaimed before commit, discarding result"
            );
            self.audit.log(AuditEvent::new(
                "commit_discarded",
                json!({ "instance": self.id, "task_id": task.id }),
            ));
            return Ok(ProcessOutcome::Reclaimed { task_id: task.id });
        }

        info!(
            instance = %self.id,
            task_id = %task.id,
            %destination,
            score,
            "Task routed"
        );
        self.audit.log(AuditEvent::new(
            "task_routed",
            json!({
                "instance": self.id,
                "task_id": task.id,
                "destination": destination,
                "score": score,
                "reason": reason,
            }),
        ));
        self.progress.on_task_routed(&task.id, destination, score);

        if let Some(result) = record.as_result() {
            self.publish_vocabulary(result).await;
        }

        Ok(ProcessOutcome::Routed {
            task_id: task.id,
            destination,
            score,
        })
    }

    async fn fail_unreadable(
        &self,
        raw: &str,
        error: serde_json::Error,
    ) -> Result<ProcessOutcome, OrchestratorError> {
        let task_id = claim_key(raw);
        warn!(instance = %self.id, error = %error, item = %preview(raw, 80), "Unreadable task");

        let record = TerminalRecord::Failed(FailureRecord {
            task_id: task_id.clone(),
            error: error.to_string(),
            raw_preview: preview(raw, PREVIEW_BYTES),
            orchestrator: self.id.to_string(),
            failed_at: now(),
        });
        let payload = serde_json::to_string(&record)?;

        self.store
            .commit(
                &self.processing(),
                raw,
                &self.keys().terminal(TerminalQueue::Failed),
                &payload,
            )
            .await?;
        if let Some(id) = &task_id {
            self.release_claim(id).await;
        }
        self.audit.log(AuditEvent::new(
            "task_failed",
            json!({ "instance": self.id, "task_id": task_id, "error": error.to_string() }),
        ));

        Ok(ProcessOutcome::Failed {
            task_id,
            error: error.to_string(),
        })
    }

    async fn release_claim(&self, task_id: &TaskId) {
        if let Err(e) = self
            .store
            .hash_delete(&self.keys().claims(self.id.as_str()), task_id.as_str())
            .await
        {
            debug!(task_id = %task_id, error = %e, "Failed to clear claim record");
        }
    }

    /// Best-effort broadcast; never fails the task.
    async fn publish_vocabulary(&self, result: &swarm_domain::TaskResult) {
        let updates = self.process.vocabulary_updates(result);
        if updates.is_empty() {
            return;
        }

        let broadcast = VocabularyBroadcast {
            source_instance: self.id.to_string(),
            updates,
        };
        let message = match serde_json::to_string(&broadcast) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to serialize vocabulary update");
                return;
            }
        };

        match self
            .store
            .publish(&self.keys().vocabulary_channel(), &message)
            .await
        {
            Ok(receivers) => debug!(
                task_id = %result.task_id,
                updates = broadcast.updates.len(),
                receivers,
                "Vocabulary update published"
            ),
            Err(e) => warn!(task_id = %result.task_id, error = %e, "Vocabulary publish failed"),
        }
    }

    // ==================== Lifecycle ====================

    /// Run until `cancel` fires, then shut down gracefully.
    ///
    /// Maintenance runs on its own task so that a long wave never delays the
    /// heartbeat.
    ///
    /// A non-transient store error stops the loop early: the instance still
    /// shuts down, then the error is returned.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), OrchestratorError> {
        self.register().await?;

        let maintenance_token = cancel.child_token();
        let maintenance = {
            let this = Arc::clone(&self);
            let token = maintenance_token.clone();
            tokio::spawn(async move { this.maintenance_loop(token).await })
        };

        info!(instance = %self.id, "Orchestrator started");

        let mut fatal = None;
        loop {
            let claimed = tokio::select! {
                _ = cancel.cancelled() => break,
                claimed = self.claim_next() => claimed,
            };

            let outcome = match claimed {
                Ok(Some(raw)) => self.process_claimed(&raw).await.map(drop),
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };
            let Err(e) = outcome else {
                continue;
            };

            if e.is_transient() {
                warn!(
                    instance = %self.id,
                    error = %e,
                    "Store unavailable, retrying; any claimed task is left for recovery"
                );
                self.backoff(&cancel).await;
            } else {
                error!(instance = %self.id, error = %e, "Unrecoverable error, stopping instance");
                fatal = Some(e);
                break;
            }
        }

        maintenance_token.cancel();
        if let Err(e) = maintenance.await {
            warn!("Maintenance task join error: {}", e);
        }
        let stopped = self.shutdown().await;

        match fatal {
            Some(e) => {
                if let Err(shutdown_error) = stopped {
                    warn!(instance = %self.id, error = %shutdown_error, "Shutdown after failure also failed");
                }
                Err(e)
            }
            None => stopped,
        }
    }

    async fn maintenance_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.params.heartbeat_interval);
        // First tick fires immediately; registration just wrote a heartbeat
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let report = self.maintenance_tick().await;
            if !report.failovers.is_empty() || report.reclaimed > 0 {
                debug!(instance = %self.id, ?report, "Maintenance recovered work");
            }
        }
    }

    async fn backoff(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.params.retry_backoff) => {}
        }
    }

    /// Deregister and hand any in-flight tasks back to pending.
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        let keys = self.keys();

        self.store
            .set_remove(&keys.active_set(), self.id.as_str())
            .await?;
        self.store
            .hash_set(
                &keys.registration(self.id.as_str()),
                &[(
                    "status".to_string(),
                    InstanceStatus::Stopped.as_str().to_string(),
                )],
            )
            .await?;
        // Kept long enough for peers and operators to see the stopped status
        self.store
            .expire(
                &keys.registration(self.id.as_str()),
                self.params.heartbeat_timeout,
            )
            .await?;
        self.store.delete(&keys.lease(self.id.as_str())).await?;

        let processing = self.processing();
        let pending = keys.pending();
        let mut drained = 0;
        while self.store.move_one(&processing, &pending).await?.is_some() {
            drained += 1;
        }
        self.store.delete(&keys.claims(self.id.as_str())).await?;

        info!(instance = %self.id, drained, "Orchestrator stopped");
        self.audit.log(AuditEvent::new(
            "orchestrator_stopped",
            json!({ "instance": self.id, "drained": drained }),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::ports::agent::{AgentError, TranscriptAgent};
    use crate::registry::AgentRegistry;
    use crate::testing::FakeStore;
    use crate::use_cases::run_waves::RunWavesUseCase;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use swarm_domain::agent::catalog::profile;
    use swarm_domain::{
        AgentId, AgentProfile, AgentResult, AnalysisContext, OrchestratorKind, Pattern,
        PatternStrength,
    };

    // ==================== Test Mocks ====================

    struct ConfidentAgent(AgentProfile);

    #[async_trait]
    impl TranscriptAgent for ConfidentAgent {
        fn profile(&self) -> &AgentProfile {
            &self.0
        }

        async fn analyze(
            &self,
            _text: &str,
            _context: &AnalysisContext,
        ) -> Result<AgentResult, AgentError> {
            let patterns = if self.0.id == AgentId::SomaticAwareness {
                vec![Pattern {
                    pattern: "sensations:tightness".into(),
                    frequency: 6,
                    strength: PatternStrength::Strong,
                }]
            } else {
                vec![]
            };
            Ok(AgentResult::new(
                self.0.id,
                self.0.wave,
                vec![],
                patterns,
                0.95,
                now(),
            ))
        }
    }

    #[derive(Default)]
    struct RecordingAudit(Mutex<Vec<&'static str>>);

    impl AuditLogger for RecordingAudit {
        fn log(&self, event: AuditEvent) {
            self.0.lock().unwrap().push(event.event_type);
        }
    }

    fn process() -> ProcessTaskUseCase {
        let registry = AgentId::ALL.iter().fold(AgentRegistry::new(), |r, id| {
            r.register(ConfidentAgent(profile(*id)))
        });
        ProcessTaskUseCase::new(
            RunWavesUseCase::new(Arc::new(registry)),
            EvaluationConfig::default(),
        )
    }

    fn params() -> OrchestratorParams {
        OrchestratorParams::default()
            .with_claim_timeout(Duration::from_millis(20))
            .with_retry_backoff(Duration::from_millis(10))
            .with_heartbeat(Duration::from_millis(50), Duration::from_secs(30))
    }

    fn orchestrator(store: &Arc<FakeStore>, id: &str) -> Orchestrator<FakeStore> {
        Orchestrator::new(Arc::clone(store), process(), params()).with_id(InstanceId::new(id))
    }

    async fn submit(store: &FakeStore, task: &Task) -> String {
        let raw = serde_json::to_string(task).unwrap();
        store.push(&QueueKeys::default().pending(), &raw).await.unwrap();
        raw
    }

    /// A peer that registered long ago and never heartbeated since.
    async fn plant_dead_peer(store: &FakeStore, peer: &str, tasks: &[&str]) {
        let keys = QueueKeys::default();
        let old = parse_timestamp("2020-01-01T00:00:00Z").unwrap();
        let registration =
            OrchestratorRegistration::new(InstanceId::new(peer), OrchestratorKind::Cli, old);
        store
            .hash_set(&keys.registration(peer), &registration.to_fields())
            .await
            .unwrap();
        store.set_add(&keys.active_set(), peer).await.unwrap();
        for task in tasks {
            store.push(&keys.processing(peer), task).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_register_writes_record_set_and_lease() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        orch.register().await.unwrap();

        let keys = QueueKeys::default();
        let fields = store.hash_get_all(&keys.registration("cli-aaaa0001")).await.unwrap();
        assert_eq!(fields["type"], "cli");
        assert_eq!(fields["status"], "active");
        assert!(store.set_members(&keys.active_set()).await.unwrap().contains(&"cli-aaaa0001".to_string()));
        assert!(store.get(&keys.lease("cli-aaaa0001")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_claim_moves_task_and_records_claim() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        let task = Task::new("Client: hi");
        let raw = submit(&store, &task).await;

        let claimed = orch.claim_next().await.unwrap();
        assert_eq!(claimed.as_deref(), Some(raw.as_str()));

        let keys = QueueKeys::default();
        assert_eq!(store.len(&keys.pending()).await.unwrap(), 0);
        assert_eq!(store.range(&keys.processing("cli-aaaa0001")).await.unwrap(), vec![raw]);
        let claims = store.hash_get_all(&keys.claims("cli-aaaa0001")).await.unwrap();
        assert!(claims.contains_key(task.id.as_str()));

        assert!(orch.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_process_commits_to_exactly_one_terminal_queue() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        let task = Task::new("Client: hi");
        submit(&store, &task).await;

        let raw = orch.claim_next().await.unwrap().unwrap();
        let outcome = orch.process_claimed(&raw).await.unwrap();

        let ProcessOutcome::Routed { destination, score, .. } = outcome else {
            panic!("expected routed outcome, got {outcome:?}");
        };
        assert_eq!(destination, TerminalQueue::Completed);
        assert!(score >= 8.0);

        let keys = QueueKeys::default();
        assert_eq!(store.len(&keys.processing("cli-aaaa0001")).await.unwrap(), 0);
        assert!(store.hash_get_all(&keys.claims("cli-aaaa0001")).await.unwrap().is_empty());
        let mut total = 0;
        for queue in TerminalQueue::ALL {
            total += store.len(&keys.terminal(queue)).await.unwrap();
        }
        assert_eq!(total, 1);

        let stored = store.range(&keys.terminal(TerminalQueue::Completed)).await.unwrap();
        let record: TerminalRecord = serde_json::from_str(&stored[0]).unwrap();
        assert_eq!(record.task_id(), Some(&task.id));
    }

    #[tokio::test]
    async fn test_unreadable_task_goes_to_failed_queue() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        let keys = QueueKeys::default();
        store.push(&keys.pending(), "{not json").await.unwrap();

        let raw = orch.claim_next().await.unwrap().unwrap();
        let outcome = orch.process_claimed(&raw).await.unwrap();

        assert!(matches!(outcome, ProcessOutcome::Failed { task_id: None, .. }));
        assert_eq!(store.len(&keys.processing("cli-aaaa0001")).await.unwrap(), 0);
        let failed = store.range(&keys.terminal(TerminalQueue::Failed)).await.unwrap();
        let record: TerminalRecord = serde_json::from_str(&failed[0]).unwrap();
        assert_eq!(record.destination(), TerminalQueue::Failed);
    }

    #[tokio::test]
    async fn test_reclaimed_task_is_not_committed_twice() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        let task = Task::new("Client: hi");
        submit(&store, &task).await;
        let raw = orch.claim_next().await.unwrap().unwrap();

        // A peer requeues the task while this instance is still working on it
        let keys = QueueKeys::default();
        assert!(store
            .requeue(&keys.processing("cli-aaaa0001"), &raw, &keys.pending())
            .await
            .unwrap());

        let outcome = orch.process_claimed(&raw).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Reclaimed { task_id: task.id });
        for queue in TerminalQueue::ALL {
            assert_eq!(store.len(&keys.terminal(queue)).await.unwrap(), 0);
        }
        assert_eq!(store.len(&keys.pending()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dead_peer_tasks_return_to_pending_once() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        orch.register().await.unwrap();
        plant_dead_peer(&store, "cli-dead0001", &["task-a", "task-b"]).await;

        let recovered = orch.check_peer_health().await.unwrap();
        assert_eq!(recovered, vec![(InstanceId::new("cli-dead0001"), 2)]);

        let keys = QueueKeys::default();
        let mut pending = store.range(&keys.pending()).await.unwrap();
        pending.sort();
        assert_eq!(pending, vec!["task-a", "task-b"]);
        assert!(!store.set_members(&keys.active_set()).await.unwrap().contains(&"cli-dead0001".to_string()));
        assert!(store.hash_get_all(&keys.registration("cli-dead0001")).await.unwrap().is_empty());

        // A second scan, or a second instance handling the same peer, moves nothing
        assert!(orch.check_peer_health().await.unwrap().is_empty());
        assert_eq!(orch.handle_peer_failure(&InstanceId::new("cli-dead0001")).await.unwrap(), 0);
        assert_eq!(store.len(&keys.pending()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_live_peer_is_left_alone() {
        let store = Arc::new(FakeStore::default());
        let a = orchestrator(&store, "cli-aaaa0001");
        let b = orchestrator(&store, "cli-bbbb0002");
        a.register().await.unwrap();
        b.register().await.unwrap();
        store
            .push(&QueueKeys::default().processing("cli-bbbb0002"), "task-b")
            .await
            .unwrap();

        assert!(a.check_peer_health().await.unwrap().is_empty());
        assert_eq!(
            store.len(&QueueKeys::default().processing("cli-bbbb0002")).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_expired_lease_with_fresh_heartbeat_is_alive() {
        let store = Arc::new(FakeStore::default());
        let a = orchestrator(&store, "cli-aaaa0001");
        let b = orchestrator(&store, "cli-bbbb0002");
        a.register().await.unwrap();
        b.register().await.unwrap();
        store.lapse(&QueueKeys::default().lease("cli-bbbb0002"));

        assert!(a.check_peer_health().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_claim_is_requeued_even_if_owner_alive() {
        let store = Arc::new(FakeStore::default());
        let owner = orchestrator(&store, "cli-aaaa0001");
        let sweeper = Orchestrator::new(
            Arc::clone(&store),
            process(),
            params().with_task_lease(Duration::from_secs(60)),
        )
        .with_id(InstanceId::new("cli-bbbb0002"));
        owner.register().await.unwrap();

        let task = Task::new("Client: hi");
        submit(&store, &task).await;
        owner.claim_next().await.unwrap().unwrap();

        let keys = QueueKeys::default();
        // Fresh claim: nothing to do
        assert_eq!(sweeper.sweep_stale_claims().await.unwrap(), 0);

        store
            .hash_set(
                &keys.claims("cli-aaaa0001"),
                &[(task.id.to_string(), "2020-01-01T00:00:00.000Z".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(sweeper.sweep_stale_claims().await.unwrap(), 1);
        assert_eq!(store.len(&keys.pending()).await.unwrap(), 1);
        assert_eq!(store.len(&keys.processing("cli-aaaa0001")).await.unwrap(), 0);
        assert!(store.hash_get_all(&keys.claims("cli-aaaa0001")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_deregisters_and_drains() {
        let store = Arc::new(FakeStore::default());
        let orch = orchestrator(&store, "cli-aaaa0001");
        orch.register().await.unwrap();
        submit(&store, &Task::new("one")).await;
        orch.claim_next().await.unwrap().unwrap();

        orch.shutdown().await.unwrap();

        let keys = QueueKeys::default();
        assert!(store.set_members(&keys.active_set()).await.unwrap().is_empty());
        assert_eq!(store.len(&keys.pending()).await.unwrap(), 1);
        assert_eq!(store.len(&keys.processing("cli-aaaa0001")).await.unwrap(), 0);
        assert!(store.get(&keys.lease("cli-aaaa0001")).await.unwrap().is_none());
        let fields = store.hash_get_all(&keys.registration("cli-aaaa0001")).await.unwrap();
        assert_eq!(fields["status"], "stopped");
        assert_eq!(
            store.ttl(&keys.registration("cli-aaaa0001")),
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn test_heartbeat_restores_a_deleted_registration() {
        let store = Arc::new(FakeStore::default());
        let a = orchestrator(&store, "cli-aaaa0001");
        a.register().await.unwrap();

        // A peer wrongly declared this instance dead
        a.handle_peer_failure(&InstanceId::new("cli-aaaa0001")).await.unwrap();
        let keys = QueueKeys::default();
        assert!(store.hash_get_all(&keys.registration("cli-aaaa0001")).await.unwrap().is_empty());

        a.heartbeat().await.unwrap();
        let fields = store.hash_get_all(&keys.registration("cli-aaaa0001")).await.unwrap();
        let registration =
            OrchestratorRegistration::from_fields(InstanceId::new("cli-aaaa0001"), &fields).unwrap();
        assert_eq!(registration.status, InstanceStatus::Active);
        assert_eq!(registration.started_at, a.started_at);
        assert!(store.set_members(&keys.active_set()).await.unwrap().contains(&"cli-aaaa0001".to_string()));
    }

    #[tokio::test]
    async fn test_high_score_publishes_vocabulary_update() {
        let store = Arc::new(FakeStore::default());
        let audit = Arc::new(RecordingAudit::default());
        let orch = orchestrator(&store, "cli-aaaa0001").with_audit(audit.clone());
        let mut subscription = store
            .subscribe(&QueueKeys::default().vocabulary_channel())
            .await
            .unwrap();

        submit(&store, &Task::new("Client: hi")).await;
        let raw = orch.claim_next().await.unwrap().unwrap();
        orch.process_claimed(&raw).await.unwrap();

        let message = subscription.try_recv().expect("broadcast");
        let broadcast: VocabularyBroadcast = serde_json::from_str(&message).unwrap();
        assert_eq!(broadcast.source_instance, "cli-aaaa0001");
        assert_eq!(broadcast.updates[0].pattern, "sensations:tightness");
        assert_eq!(broadcast.updates[0].frequency, 6);

        let events = audit.0.lock().unwrap().clone();
        assert_eq!(events, vec!["task_claimed", "task_routed"]);
    }

    #[tokio::test]
    async fn test_run_processes_until_cancelled() {
        let store = Arc::new(FakeStore::default());
        let orch = Arc::new(orchestrator(&store, "cli-aaaa0001"));
        submit(&store, &Task::new("one")).await;
        submit(&store, &Task::new("two")).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&orch).run(cancel.clone()));

        let keys = QueueKeys::default();
        let completed = keys.terminal(TerminalQueue::Completed);
        for _ in 0..200 {
            if store.len(&completed).await.unwrap() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(store.len(&completed).await.unwrap(), 2);
        assert!(store.set_members(&keys.active_set()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_retries_through_connection_loss() {
        let store = Arc::new(FakeStore::default());
        store.fail_claims([
            StoreError::ConnectionError("connection refused".into()),
            StoreError::Timeout,
        ]);
        let orch = Arc::new(orchestrator(&store, "cli-aaaa0001"));
        submit(&store, &Task::new("one")).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&orch).run(cancel.clone()));

        let completed = QueueKeys::default().terminal(TerminalQueue::Completed);
        for _ in 0..200 {
            if store.len(&completed).await.unwrap() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(store.len(&completed).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_unrecoverable_store_error() {
        let store = Arc::new(FakeStore::default());
        store.fail_claims([StoreError::WrongType {
            key: "tasks:pending".into(),
            expected: "list",
        }]);
        let orch = Arc::new(orchestrator(&store, "cli-aaaa0001"));

        // Never cancelled: the error alone must end the loop
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Arc::clone(&orch).run(CancellationToken::new()),
        )
        .await
        .expect("run should stop by itself");

        let err = result.unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, OrchestratorError::Store(StoreError::WrongType { .. })));

        let keys = QueueKeys::default();
        assert!(store.set_members(&keys.active_set()).await.unwrap().is_empty());
        let fields = store.hash_get_all(&keys.registration("cli-aaaa0001")).await.unwrap();
        assert_eq!(fields["status"], "stopped");
    }
}
