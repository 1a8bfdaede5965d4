//! Agent Registry
//!
//! The [`AgentRegistry`] maps agent ids to loaded implementations. It is
//! populated once at startup and then shared read-only by every task.
//!
//! Which agents belong to which wave is fixed by the catalog; the registry
//! only answers whether an agent is loaded. An agent the catalog schedules
//! but the registry lacks is skipped by the scheduler.

use crate::ports::agent::TranscriptAgent;
use std::collections::BTreeMap;
use std::sync::Arc;
use swarm_domain::agent::catalog::agents_in_wave;
use swarm_domain::{AgentId, Wave};

#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Arc<dyn TranscriptAgent>>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, replacing any earlier one with the same id
    pub fn register<A: TranscriptAgent + 'static>(self, agent: A) -> Self {
        self.register_arc(Arc::new(agent))
    }

    /// Register an agent (Arc version)
    pub fn register_arc(mut self, agent: Arc<dyn TranscriptAgent>) -> Self {
        self.agents.insert(agent.id(), agent);
        self
    }

    /// Drop an agent, e.g. one disabled by configuration.
    pub fn without(mut self, id: AgentId) -> Self {
        self.agents.remove(&id);
        self
    }

    pub fn get(&self, id: AgentId) -> Option<Arc<dyn TranscriptAgent>> {
        self.agents.get(&id).cloned()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Loaded agents scheduled in `wave`, in catalog order.
    pub fn loaded_in_wave(&self, wave: Wave) -> Vec<AgentId> {
        agents_in_wave(wave)
            .into_iter()
            .filter(|id| self.contains(*id))
            .collect()
    }

    /// Agents the catalog schedules in `wave` that are not loaded.
    pub fn missing_in_wave(&self, wave: Wave) -> Vec<AgentId> {
        agents_in_wave(wave)
            .into_iter()
            .filter(|id| !self.contains(*id))
            .collect()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.ids())
            .finish()
    }
}
