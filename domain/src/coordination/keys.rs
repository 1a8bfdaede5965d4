use crate::routing::TerminalQueue;

/// Names of every list, hash, set and channel in the shared store.
///
/// With an empty namespace the names are `tasks:pending`,
/// `tasks:processing:<instance>`, `orchestrators:active` and so on. A
/// namespace lets several independent swarms share one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueKeys {
    namespace: String,
}

impl QueueKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", self.namespace, name)
        }
    }

    pub fn pending(&self) -> String {
        self.key("tasks:pending")
    }

    /// Private processing list of one instance.
    pub fn processing(&self, instance: &str) -> String {
        self.key(&format!("tasks:processing:{instance}"))
    }

    /// Claim timestamps (`task_id → claimed_at`) of one instance.
    pub fn claims(&self, instance: &str) -> String {
        self.key(&format!("tasks:claims:{instance}"))
    }

    pub fn terminal(&self, queue: TerminalQueue) -> String {
        self.key(&format!("tasks:{}", queue.as_str()))
    }

    pub fn registration(&self, instance: &str) -> String {
        self.key(&format!("orchestrators:{instance}"))
    }

    /// Expiring key refreshed with every heartbeat.
    pub fn lease(&self, instance: &str) -> String {
        self.key(&format!("orchestrators:{instance}:lease"))
    }

    pub fn active_set(&self) -> String {
        self.key("orchestrators:active")
    }

    pub fn vocabulary_channel(&self) -> String {
        self.key("vocabulary:updates")
    }
}
