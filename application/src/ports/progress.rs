//! Progress notification port
//!
//! Defines the interface for reporting progress while a task moves through
//! the waves.

use swarm_domain::{AgentId, TaskId, TerminalQueue, Wave};

/// Callback for progress updates during task processing
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain log lines, etc.)
pub trait WaveProgressNotifier: Send + Sync {
    /// Called when a wave starts with the number of loaded agents
    fn on_wave_start(&self, task_id: &TaskId, wave: Wave, total_agents: usize);

    /// Called when an agent finishes within a wave
    fn on_agent_complete(&self, task_id: &TaskId, wave: Wave, agent: AgentId, success: bool);

    /// Called when a wave completes
    fn on_wave_complete(&self, task_id: &TaskId, wave: Wave);

    /// Called once the task has been committed to a terminal queue.
    fn on_task_routed(&self, _task_id: &TaskId, _destination: TerminalQueue, _score: f64) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl WaveProgressNotifier for NoProgress {
    fn on_wave_start(&self, _task_id: &TaskId, _wave: Wave, _total_agents: usize) {}
    fn on_agent_complete(&self, _task_id: &TaskId, _wave: Wave, _agent: AgentId, _success: bool) {
    }
    fn on_wave_complete(&self, _task_id: &TaskId, _wave: Wave) {}
}
