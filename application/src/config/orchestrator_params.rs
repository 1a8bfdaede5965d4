//! Orchestrator parameters: loop timing and store layout.
//!
//! [`OrchestratorParams`] groups the static parameters that control the
//! claim loop, heartbeats and failover in
//! [`Orchestrator`](crate::use_cases::orchestrator::Orchestrator).
//! These are application-layer concerns, not domain policy.

use std::time::Duration;
use swarm_domain::{OrchestratorKind, QueueKeys};

/// Timing and identity parameters for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorParams {
    pub kind: OrchestratorKind,
    /// How often the registration is refreshed and peers are checked.
    pub heartbeat_interval: Duration,
    /// Heartbeat age after which a peer is declared dead.
    pub heartbeat_timeout: Duration,
    /// How long a claim waits for the pending queue.
    pub claim_timeout: Duration,
    /// Pause after a store error before the loop retries.
    pub retry_backoff: Duration,
    /// Claim age after which a task is reclaimable even from a live owner.
    pub task_lease: Duration,
    /// Per-agent timeout inside a wave; `None` waits indefinitely.
    pub agent_timeout: Option<Duration>,
    pub keys: QueueKeys,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            kind: OrchestratorKind::Cli,
            heartbeat_interval: Duration::from_secs(10),
            heartbeat_timeout: Duration::from_secs(30),
            claim_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(1),
            task_lease: Duration::from_secs(300),
            agent_timeout: Some(Duration::from_secs(60)),
            keys: QueueKeys::default(),
        }
    }
}

impl OrchestratorParams {
    // ==================== Builder Methods ====================

    pub fn with_kind(mut self, kind: OrchestratorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_timeout = timeout;
        self
    }

    pub fn with_claim_timeout(mut self, timeout: Duration) -> Self {
        self.claim_timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_task_lease(mut self, lease: Duration) -> Self {
        self.task_lease = lease;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_keys(mut self, keys: QueueKeys) -> Self {
        self.keys = keys;
        self
    }
}
