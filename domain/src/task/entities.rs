use super::value_objects::TaskId;
use crate::core::clock::now;
use crate::gate::CrossValidation;
use crate::routing::{RoutingDecision, TerminalQueue};
use crate::scoring::CompositeScore;
use crate::wave::WaveTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A transcript waiting to be analyzed.
///
/// The serialized form is what sits on the pending and processing lists.
/// The claim protocol compares list items byte-for-byte, so a task is
/// serialized once at submission and the same string is moved around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub payload: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub source: String,
    pub submitted_at: DateTime<Utc>,
    /// File the payload was read from, for batch submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Task {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            id: TaskId::generate(),
            payload: payload.into(),
            context: Map::new(),
            source: "api".to_string(),
            submitted_at: now(),
            path: None,
        }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// Aggregate outcome of all waves for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Instance that processed the task.
    pub orchestrator: String,
    pub processed_at: DateTime<Utc>,
    pub waves: WaveTable,
    pub cross_validation: CrossValidation,
    pub composite_score: CompositeScore,
    pub routing: RoutingDecision,
}

impl TaskResult {
    pub fn destination(&self) -> TerminalQueue {
        self.routing.destination
    }

    pub fn score(&self) -> f64 {
        self.composite_score.value
    }
}

/// A task that could not be analyzed at all (e.g. unparseable record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub task_id: Option<TaskId>,
    pub error: String,
    /// Leading bytes of the raw queue item, for diagnosis.
    pub raw_preview: String,
    pub orchestrator: String,
    pub failed_at: DateTime<Utc>,
}

/// Anything pushed to a terminal queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalRecord {
    Analyzed(TaskResult),
    Failed(FailureRecord),
}

impl TerminalRecord {
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            TerminalRecord::Analyzed(result) => Some(&result.task_id),
            TerminalRecord::Failed(failure) => failure.task_id.as_ref(),
        }
    }

    pub fn destination(&self) -> TerminalQueue {
        match self {
            TerminalRecord::Analyzed(result) => result.destination(),
            TerminalRecord::Failed(_) => TerminalQueue::Failed,
        }
    }

    pub fn as_result(&self) -> Option<&TaskResult> {
        match self {
            TerminalRecord::Analyzed(result) => Some(result),
            TerminalRecord::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_json_shape() {
        let task = Task::new("Client: hello")
            .with_source("cli")
            .with_path("sessions/one.txt")
            .with_context_value("client", Value::from("anon-7"));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["payload"], "Client: hello");
        assert_eq!(json["source"], "cli");
        assert_eq!(json["path"], "sessions/one.txt");
        assert_eq!(json["context"]["client"], "anon-7");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_context_defaults_to_empty() {
        let json = r#"{"id":"t1","payload":"x","source":"cli","submitted_at":"2026-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.context.is_empty());
        assert!(task.path.is_none());
    }

    #[test]
    fn test_failure_record_routes_to_failed() {
        let record = TerminalRecord::Failed(FailureRecord {
            task_id: None,
            error: "expected value".into(),
            raw_preview: "{not json".into(),
            orchestrator: "cli-1234abcd".into(),
            failed_at: now(),
        });
        assert_eq!(record.destination(), TerminalQueue::Failed);
        assert!(record.task_id().is_none());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "failed");
    }
}
