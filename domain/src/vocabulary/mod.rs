//! Vocabulary-update broadcast.
//!
//! High-scoring tasks share their strong patterns so that listeners (a
//! dashboard, a curator) can grow the vocabularies. Delivery is best-effort.

use crate::agent::AgentId;
use crate::wave::WaveTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyUpdate {
    pub agent: AgentId,
    pub pattern: String,
    pub frequency: usize,
    pub timestamp: DateTime<Utc>,
}

/// Message published on the vocabulary channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyBroadcast {
    pub source_instance: String,
    pub updates: Vec<VocabularyUpdate>,
}

/// Strong patterns from every completed agent, in wave then agent order.
pub fn collect_updates(waves: &WaveTable, now: DateTime<Utc>) -> Vec<VocabularyUpdate> {
    waves
        .entries()
        .filter_map(|(_, outcome)| outcome.result())
        .flat_map(|result| {
            result.strong_patterns().map(move |p| VocabularyUpdate {
                agent: result.agent,
                pattern: p.pattern.clone(),
                frequency: p.frequency,
                timestamp: now,
            })
        })
        .collect()
}
