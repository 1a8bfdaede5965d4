use crate::agent::{AgentId, AgentOutcome, AgentResult, Wave};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat context key for an agent's result, e.g. `wave_2_somatic_awareness`.
pub fn context_key(wave: Wave, agent: AgentId) -> String {
    format!("wave_{}_{}", wave.number(), agent)
}

/// Wave number → agent → outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveTable {
    waves: BTreeMap<Wave, BTreeMap<AgentId, AgentOutcome>>,
}

impl WaveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, wave: Wave, outcome: AgentOutcome) {
        self.waves
            .entry(wave)
            .or_default()
            .insert(outcome.agent(), outcome);
    }

    /// Record a wave that ran with no agents available, so it still shows up.
    pub fn mark_wave(&mut self, wave: Wave) {
        self.waves.entry(wave).or_default();
    }

    pub fn get(&self, wave: Wave, agent: AgentId) -> Option<&AgentOutcome> {
        self.waves.get(&wave).and_then(|agents| agents.get(&agent))
    }

    /// The successful result of `agent` in `wave`, if any.
    pub fn result(&self, wave: Wave, agent: AgentId) -> Option<&AgentResult> {
        self.get(wave, agent).and_then(AgentOutcome::result)
    }

    pub fn wave(&self, wave: Wave) -> Option<&BTreeMap<AgentId, AgentOutcome>> {
        self.waves.get(&wave)
    }

    pub fn waves(&self) -> impl Iterator<Item = Wave> + '_ {
        self.waves.keys().copied()
    }

    /// Every outcome with its wave, in wave then agent order.
    pub fn entries(&self) -> impl Iterator<Item = (Wave, &AgentOutcome)> {
        self.waves
            .iter()
            .flat_map(|(wave, agents)| agents.values().map(move |o| (*wave, o)))
    }

    pub fn context_keys(&self) -> Vec<String> {
        self.entries()
            .map(|(wave, outcome)| context_key(wave, outcome.agent()))
            .collect()
    }

    pub fn outcome_count(&self) -> usize {
        self.waves.values().map(BTreeMap::len).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.entries().filter(|(_, o)| o.is_failed()).count()
    }
}
