//! Agent output types.
//!
//! An [`AgentResult`] is created once per agent per task and never mutated
//! afterwards. Its `signature` binds the agent identity to the result body so
//! that a tampered record can be detected when it is read back from a queue.

use super::value_objects::{AgentId, Wave};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A single vocabulary hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// 1-based line number within the transcript.
    pub line_number: usize,
    pub category: String,
    pub term: String,
    /// The matching line, trimmed.
    pub context: String,
    pub confidence: f64,
}

/// How often a pattern recurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStrength {
    Moderate,
    Strong,
}

/// A `category:term` key that recurred often enough to be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern: String,
    pub frequency: usize,
    pub strength: PatternStrength,
}

impl Pattern {
    pub fn is_strong(&self) -> bool {
        self.strength == PatternStrength::Strong
    }
}

/// Output of one successful agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent: AgentId,
    pub wave: Wave,
    pub findings: Vec<Finding>,
    pub patterns: Vec<Pattern>,
    /// Aggregate confidence in 0.0..=1.0
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// Set when the agent refused its input (oversized or suspicious).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_rejected: Option<String>,
    #[serde(default)]
    pub signature: String,
}

impl AgentResult {
    /// Build and sign a result.
    pub fn new(
        agent: AgentId,
        wave: Wave,
        findings: Vec<Finding>,
        patterns: Vec<Pattern>,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut result = Self {
            agent,
            wave,
            findings,
            patterns,
            confidence,
            timestamp,
            input_rejected: None,
            signature: String::new(),
        };
        result.signature = result.compute_signature();
        result
    }

    /// An empty result for input the agent refused to analyze.
    pub fn rejected(
        agent: AgentId,
        wave: Wave,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut result = Self {
            agent,
            wave,
            findings: Vec::new(),
            patterns: Vec::new(),
            confidence: 0.0,
            timestamp,
            input_rejected: Some(reason.into()),
            signature: String::new(),
        };
        result.signature = result.compute_signature();
        result
    }

    /// SHA-256 over `"<agent>:<canonical body JSON>"`, hex encoded.
    ///
    /// The body is every field except `signature`, with object keys sorted.
    pub fn compute_signature(&self) -> String {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut body {
            map.remove("signature");
        }
        let canonical = canonicalize(&body).to_string();

        let mut hasher = Sha256::new();
        hasher.update(self.agent.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True if the stored signature matches the current content.
    pub fn verify_signature(&self) -> bool {
        !self.signature.is_empty() && self.signature == self.compute_signature()
    }

    pub fn strong_patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().filter(|p| p.is_strong())
    }
}

/// Rebuild a value with object keys inserted in sorted order.
///
/// Produces the same text whether or not serde_json preserves insertion order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// What an agent slot in the wave table holds.
///
/// A failing agent is recorded, never propagated: the task carries on with
/// the remaining agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    Completed(AgentResult),
    Failed {
        agent: AgentId,
        wave: Wave,
        error: String,
    },
}

impl AgentOutcome {
    pub fn agent(&self) -> AgentId {
        match self {
            AgentOutcome::Completed(r) => r.agent,
            AgentOutcome::Failed { agent, .. } => *agent,
        }
    }

    pub fn result(&self) -> Option<&AgentResult> {
        match self {
            AgentOutcome::Completed(r) => Some(r),
            AgentOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AgentOutcome::Failed { .. })
    }
}
