//! Queue naming from TOML (`[queues]` section)

use serde::{Deserialize, Serialize};
use swarm_domain::QueueKeys;

/// Raw queue configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQueuesConfig {
    /// Prefix for every store key; empty keeps the bare `tasks:pending` names
    pub namespace: String,
}

impl FileQueuesConfig {
    pub fn keys(&self) -> QueueKeys {
        QueueKeys::new(self.namespace.trim())
    }
}
