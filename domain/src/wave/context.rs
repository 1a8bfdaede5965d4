use super::table::WaveTable;
use serde_json::{Map, Value};

/// What an agent sees when it runs: the task's own context plus every result
/// from waves that have already finished.
///
/// Built by the scheduler once per wave, so agents in the same wave see the
/// same snapshot and never each other's output.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub task_context: Map<String, Value>,
    pub prior: WaveTable,
}

impl AnalysisContext {
    pub fn new(task_context: Map<String, Value>, prior: WaveTable) -> Self {
        Self {
            task_context,
            prior,
        }
    }
}
