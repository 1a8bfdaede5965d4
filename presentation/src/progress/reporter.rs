//! Progress reporting for wave execution and batch monitoring

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use swarm_application::{BatchStatus, WaveProgressNotifier};
use swarm_domain::{AgentId, TaskId, TerminalQueue, Wave};
use tracing::debug;

/// Reports wave progress with one bar per in-flight task
///
/// Several orchestrator instances share one reporter, so bars are keyed by
/// task id.
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle for bars that must not be overdrawn by task bars
    fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    fn wave_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn prefix(task_id: &TaskId, wave: Wave) -> String {
        let id = task_id.as_str();
        let short = id.get(..8).unwrap_or(id);
        format!("{short} {wave}")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveProgressNotifier for ProgressReporter {
    fn on_wave_start(&self, task_id: &TaskId, wave: Wave, total_agents: usize) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let pb = bars.entry(task_id.clone()).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(0));
            pb.set_style(Self::wave_style());
            pb
        });
        pb.set_length(total_agents as u64);
        pb.set_position(0);
        pb.set_prefix(Self::prefix(task_id, wave));
        pb.set_message(wave.label());
    }

    fn on_agent_complete(&self, task_id: &TaskId, _wave: Wave, agent: AgentId, success: bool) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        if let Some(pb) = bars.get(task_id) {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_wave_complete(&self, task_id: &TaskId, wave: Wave) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        if let Some(pb) = bars.get(task_id) {
            pb.set_message(format!("{} complete", wave.label().green()));
        }
    }

    fn on_task_routed(&self, task_id: &TaskId, destination: TerminalQueue, score: f64) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        if let Some(pb) = bars.remove(task_id) {
            pb.finish_and_clear();
            self.multi.remove(&pb);
        }
        if let Err(e) = self.multi.println(format!(
            "{} {} -> {} ({:.2})",
            "v".green(),
            task_id,
            destination,
            score
        )) {
            debug!(task_id = %task_id, error = %e, "Failed to print routed task");
        }
    }
}

/// Simple text-based progress (no fancy UI), for output that is not a terminal
pub struct SimpleProgress;

impl WaveProgressNotifier for SimpleProgress {
    fn on_wave_start(&self, task_id: &TaskId, wave: Wave, total_agents: usize) {
        println!(
            "{} {} {} ({} agents)",
            "->".cyan(),
            task_id,
            wave.to_string().bold(),
            total_agents
        );
    }

    fn on_agent_complete(&self, _task_id: &TaskId, _wave: Wave, agent: AgentId, success: bool) {
        if success {
            println!("  {} {}", "v".green(), agent);
        } else {
            println!("  {} {} (failed)", "x".red(), agent);
        }
    }

    fn on_wave_complete(&self, _task_id: &TaskId, _wave: Wave) {}

    fn on_task_routed(&self, task_id: &TaskId, destination: TerminalQueue, score: f64) {
        println!("{} {} -> {} ({:.2})", "=>".green(), task_id, destination, score);
    }
}

/// Overall bar for a submitted batch, fed from polling
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// Attach the batch bar to the reporter's display
    pub fn attached(reporter: &ProgressReporter, total: usize) -> Self {
        Self::with_bar(reporter.multi().add(ProgressBar::new(total as u64)))
    }

    /// A bar that draws nothing, for quiet runs
    pub fn hidden(total: usize) -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(total as u64),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold} [{bar:40.green/white}] {pos}/{len} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_prefix("Batch");
        Self { bar }
    }

    pub fn update(&self, status: &BatchStatus) {
        self.bar.set_position(status.resolved.len() as u64);
        self.bar.set_message(format!(
            "{} completed, {} review, {} failed",
            status.count(TerminalQueue::Completed),
            status.count(TerminalQueue::Review),
            status.count(TerminalQueue::Failed)
        ));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
