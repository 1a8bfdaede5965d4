//! Task queue client
//!
//! The producer and consumer side of the queues: submit tasks, look up
//! results, count queue depths, list live instances, and listen to
//! vocabulary broadcasts. Orchestrators never use this; callers such as the
//! batch command do.

use crate::ports::queue_store::{QueueStore, StoreError, Subscription};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::{
    InstanceId, OrchestratorRegistration, QueueKeys, Task, TaskId, TerminalQueue, TerminalRecord,
    VocabularyBroadcast,
};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Errors that can occur in the client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate task id in batch: {0}")]
    DuplicateId(TaskId),
}

/// Depth of every queue at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: usize,
    /// Summed over all active instances.
    pub processing: usize,
    pub completed: usize,
    pub review: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn terminal(&self) -> usize {
        self.completed + self.review + self.failed
    }

    pub fn get(&self, queue: TerminalQueue) -> usize {
        match queue {
            TerminalQueue::Completed => self.completed,
            TerminalQueue::Review => self.review,
            TerminalQueue::Failed => self.failed,
        }
    }
}

/// Result of waiting for a set of tasks.
#[derive(Debug, Clone, Default)]
pub struct BatchStatus {
    pub resolved: HashMap<TaskId, TerminalRecord>,
    pub outstanding: Vec<TaskId>,
}

impl BatchStatus {
    pub fn is_complete(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn count(&self, queue: TerminalQueue) -> usize {
        self.resolved
            .values()
            .filter(|r| r.destination() == queue)
            .count()
    }
}

/// Vocabulary broadcasts, decoded.
pub struct VocabularyFeed {
    subscription: Subscription,
}

impl VocabularyFeed {
    /// Next well-formed broadcast; malformed messages are skipped.
    pub async fn next(&mut self) -> Option<VocabularyBroadcast> {
        while let Some(message) = self.subscription.recv().await {
            match serde_json::from_str(&message) {
                Ok(broadcast) => return Some(broadcast),
                Err(e) => warn!(error = %e, "Skipping malformed vocabulary message"),
            }
        }
        None
    }

    /// A broadcast already waiting, without blocking.
    pub fn try_next(&mut self) -> Option<VocabularyBroadcast> {
        while let Some(message) = self.subscription.try_recv() {
            if let Ok(broadcast) = serde_json::from_str(&message) {
                return Some(broadcast);
            }
        }
        None
    }
}

/// Client for submitting tasks and reading results
pub struct TaskQueueClient<S: QueueStore> {
    store: Arc<S>,
    keys: QueueKeys,
}

impl<S: QueueStore> Clone for TaskQueueClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
        }
    }
}

impl<S: QueueStore> TaskQueueClient<S> {
    pub fn new(store: Arc<S>, keys: QueueKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &QueueKeys {
        &self.keys
    }

    // ==================== Submission ====================

    pub async fn submit(&self, task: &Task) -> Result<TaskId, ClientError> {
        let raw = serde_json::to_string(task)?;
        let depth = self.store.push(&self.keys.pending(), &raw).await?;
        debug!(task_id = %task.id, depth, "Task submitted");
        Ok(task.id.clone())
    }

    /// Submit every task, refusing the whole batch if two share an id.
    pub async fn submit_batch(&self, tasks: &[Task]) -> Result<Vec<TaskId>, ClientError> {
        let mut seen = std::collections::HashSet::new();
        for task in tasks {
            if !seen.insert(&task.id) {
                return Err(ClientError::DuplicateId(task.id.clone()));
            }
        }

        let mut ids = Vec::with_capacity(tasks.len());
        for task in tasks {
            ids.push(self.submit(task).await?);
        }
        Ok(ids)
    }

    // ==================== Results ====================

    /// Every readable record in a terminal queue, oldest first.
    pub async fn records(&self, queue: TerminalQueue) -> Result<Vec<TerminalRecord>, ClientError> {
        let raw = self.store.range(&self.keys.terminal(queue)).await?;
        Ok(raw
            .iter()
            .rev()
            .filter_map(|item| match serde_json::from_str(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%queue, error = %e, "Skipping unreadable terminal record");
                    None
                }
            })
            .collect())
    }

    /// Look a task up across the completed, review and failed queues.
    pub async fn find_result(&self, task_id: &TaskId) -> Result<Option<TerminalRecord>, ClientError> {
        for queue in TerminalQueue::ALL {
            if let Some(record) = self
                .records(queue)
                .await?
                .into_iter()
                .find(|r| r.task_id() == Some(task_id))
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Resolve as many of `ids` as are currently in a terminal queue.
    pub async fn batch_status(&self, ids: &[TaskId]) -> Result<BatchStatus, ClientError> {
        let mut by_id = HashMap::new();
        for queue in TerminalQueue::ALL {
            for record in self.records(queue).await? {
                if let Some(id) = record.task_id() {
                    by_id.insert(id.clone(), record);
                }
            }
        }

        let mut status = BatchStatus::default();
        for id in ids {
            match by_id.remove(id) {
                Some(record) => {
                    status.resolved.insert(id.clone(), record);
                }
                None => status.outstanding.push(id.clone()),
            }
        }
        Ok(status)
    }

    /// Poll until every id is resolved or `timeout` passes.
    ///
    /// `on_poll` sees each intermediate status, for progress display.
    pub async fn wait_for(
        &self,
        ids: &[TaskId],
        timeout: Duration,
        poll_interval: Duration,
        mut on_poll: impl FnMut(&BatchStatus) + Send,
    ) -> Result<BatchStatus, ClientError> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.batch_status(ids).await?;
            on_poll(&status);
            if status.is_complete() || Instant::now() >= deadline {
                return Ok(status);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    // ==================== Monitoring ====================

    pub async fn counts(&self) -> Result<QueueCounts, ClientError> {
        let mut processing = 0;
        for member in self.store.set_members(&self.keys.active_set()).await? {
            processing += self.store.len(&self.keys.processing(&member)).await?;
        }

        Ok(QueueCounts {
            pending: self.store.len(&self.keys.pending()).await?,
            processing,
            completed: self
                .store
                .len(&self.keys.terminal(TerminalQueue::Completed))
                .await?,
            review: self
                .store
                .len(&self.keys.terminal(TerminalQueue::Review))
                .await?,
            failed: self
                .store
                .len(&self.keys.terminal(TerminalQueue::Failed))
                .await?,
        })
    }

    /// Registrations of every instance in the active set.
    pub async fn active_instances(&self) -> Result<Vec<OrchestratorRegistration>, ClientError> {
        let mut instances = Vec::new();
        for member in self.store.set_members(&self.keys.active_set()).await? {
            let fields = self.store.hash_get_all(&self.keys.registration(&member)).await?;
            let id = InstanceId::new(member);
            match OrchestratorRegistration::from_fields(id.clone(), &fields) {
                Ok(registration) => instances.push(registration),
                Err(e) => debug!(instance = %id, error = %e, "Skipping unreadable registration"),
            }
        }
        Ok(instances)
    }

    pub async fn subscribe_vocabulary(&self) -> Result<VocabularyFeed, ClientError> {
        let subscription = self
            .store
            .subscribe(&self.keys.vocabulary_channel())
            .await?;
        Ok(VocabularyFeed { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;
    use chrono::Utc;
    use swarm_domain::{FailureRecord, OrchestratorKind};

    fn client(store: &Arc<FakeStore>) -> TaskQueueClient<FakeStore> {
        TaskQueueClient::new(Arc::clone(store), QueueKeys::default())
    }

    async fn push_failure(store: &FakeStore, id: &str) {
        let record = TerminalRecord::Failed(FailureRecord {
            task_id: Some(TaskId::new(id)),
            error: "boom".into(),
            raw_preview: "{".into(),
            orchestrator: "cli-test".into(),
            failed_at: Utc::now(),
        });
        store
            .push(
                &QueueKeys::default().terminal(TerminalQueue::Failed),
                &serde_json::to_string(&record).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_pushes_serialized_task() {
        let store = Arc::new(FakeStore::default());
        let task = Task::new("Client: hi").with_id(TaskId::new("t-1"));
        let id = client(&store).submit(&task).await.unwrap();

        assert_eq!(id, TaskId::new("t-1"));
        let pending = store.range(&QueueKeys::default().pending()).await.unwrap();
        let stored: Task = serde_json::from_str(&pending[0]).unwrap();
        assert_eq!(stored, task);
    }

    #[tokio::test]
    async fn test_batch_with_duplicate_ids_is_refused() {
        let store = Arc::new(FakeStore::default());
        let tasks = vec![
            Task::new("a").with_id(TaskId::new("same")),
            Task::new("b").with_id(TaskId::new("same")),
        ];
        let err = client(&store).submit_batch(&tasks).await.unwrap_err();
        assert!(matches!(err, ClientError::DuplicateId(_)));
        assert_eq!(store.len(&QueueKeys::default().pending()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_result_searches_terminal_queues() {
        let store = Arc::new(FakeStore::default());
        push_failure(&store, "t-9").await;
        let client = client(&store);

        let found = client.find_result(&TaskId::new("t-9")).await.unwrap();
        assert_eq!(found.unwrap().destination(), TerminalQueue::Failed);
        assert!(client.find_result(&TaskId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_and_batch_status() {
        let store = Arc::new(FakeStore::default());
        let client = client(&store);
        let keys = QueueKeys::default();
        client.submit(&Task::new("x").with_id(TaskId::new("t-1"))).await.unwrap();
        push_failure(&store, "t-2").await;
        store.set_add(&keys.active_set(), "cli-a").await.unwrap();
        store.push(&keys.processing("cli-a"), "in-flight").await.unwrap();

        let counts = client.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.terminal(), 1);

        let status = client
            .batch_status(&[TaskId::new("t-1"), TaskId::new("t-2")])
            .await
            .unwrap();
        assert!(!status.is_complete());
        assert_eq!(status.outstanding, vec![TaskId::new("t-1")]);
        assert_eq!(status.count(TerminalQueue::Failed), 1);
    }

    #[tokio::test]
    async fn test_wait_for_returns_at_deadline() {
        let store = Arc::new(FakeStore::default());
        let mut polls = 0;
        let status = client(&store)
            .wait_for(
                &[TaskId::new("never")],
                Duration::from_millis(30),
                Duration::from_millis(5),
                |_| polls += 1,
            )
            .await
            .unwrap();
        assert!(!status.is_complete());
        assert!(polls >= 2);
    }

    #[tokio::test]
    async fn test_active_instances_skips_unreadable() {
        let store = Arc::new(FakeStore::default());
        let keys = QueueKeys::default();
        let registration =
            OrchestratorRegistration::new(InstanceId::new("cli-a"), OrchestratorKind::Cli, Utc::now());
        store
            .hash_set(&keys.registration("cli-a"), &registration.to_fields())
            .await
            .unwrap();
        store.set_add(&keys.active_set(), "cli-a").await.unwrap();
        store.set_add(&keys.active_set(), "ghost").await.unwrap();

        let instances = client(&store).active_instances().await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, InstanceId::new("cli-a"));
    }

    #[tokio::test]
    async fn test_vocabulary_feed_skips_malformed() {
        let store = Arc::new(FakeStore::default());
        let mut feed = client(&store).subscribe_vocabulary().await.unwrap();
        let channel = QueueKeys::default().vocabulary_channel();
        store.publish(&channel, "garbage").await.unwrap();
        let broadcast = VocabularyBroadcast {
            source_instance: "cli-a".into(),
            updates: vec![],
        };
        store
            .publish(&channel, &serde_json::to_string(&broadcast).unwrap())
            .await
            .unwrap();

        assert_eq!(feed.try_next(), Some(broadcast));
    }
}
