//! Console output formatter for task results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use std::time::Duration;
use swarm_application::{BatchStatus, QueueCounts};
use swarm_domain::{
    AgentOutcome, FailureRecord, GateStatus, TaskResult, TerminalQueue, TerminalRecord,
};

/// Formats task results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result: every wave, every agent
    pub fn format(record: &TerminalRecord) -> String {
        match record {
            TerminalRecord::Analyzed(result) => Self::format_result(result),
            TerminalRecord::Failed(failure) => Self::format_failure(failure),
        }
    }

    fn format_result(result: &TaskResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Task {}", result.task_id)));
        output.push('\n');
        output.push_str(&Self::overview(result));

        for wave in result.waves.waves() {
            output.push_str(&Self::section_header(&format!("{} ({})", wave, wave.label())));
            let Some(outcomes) = result.waves.wave(wave) else {
                continue;
            };
            for outcome in outcomes.values() {
                match outcome {
                    AgentOutcome::Completed(agent) => {
                        let title = format!("── {} ──", agent.agent);
                        if let Some(reason) = &agent.input_rejected {
                            output.push_str(&format!(
                                "\n{}\nInput rejected: {}\n",
                                title.red().bold(),
                                reason
                            ));
                            continue;
                        }
                        output.push_str(&format!(
                            "\n{}\n{} findings, {} patterns, confidence {:.2}\n",
                            title.yellow().bold(),
                            agent.findings.len(),
                            agent.patterns.len(),
                            agent.confidence
                        ));
                        for pattern in &agent.patterns {
                            output.push_str(&format!(
                                "  * {} x{} ({:?})\n",
                                pattern.pattern, pattern.frequency, pattern.strength
                            ));
                        }
                    }
                    AgentOutcome::Failed { agent, error, .. } => {
                        output.push_str(&format!(
                            "\n{}\nError: {}\n",
                            format!("── {} ──", agent).red().bold(),
                            error
                        ));
                    }
                }
            }
        }

        output.push_str(&Self::section_header("Composite Score"));
        for dimension in &result.composite_score.dimensions {
            let value = dimension
                .value
                .map_or_else(|| "missing".to_string(), |v| format!("{v:.2}"));
            output.push_str(&format!(
                "  {:<22} {:>7} x {:.2} = {:.2}\n",
                dimension.dimension.as_str(),
                value,
                dimension.weight,
                dimension.contribution
            ));
        }

        output.push_str(&Self::disagreements(result));
        output.push_str(&Self::footer());
        output
    }

    fn format_failure(failure: &FailureRecord) -> String {
        let mut output = String::new();
        let id = failure
            .task_id
            .as_ref()
            .map_or_else(|| "<unknown>".to_string(), |id| id.to_string());

        output.push_str(&format!(
            "{} {} {}\n",
            Self::queue_label(TerminalQueue::Failed),
            "Task".bold(),
            id
        ));
        output.push_str(&format!("  {} {}\n", "Error:".red().bold(), failure.error));
        output.push_str(&format!("  {} {}\n", "Record:".dimmed(), failure.raw_preview));
        output
    }

    /// Format as JSON
    pub fn format_json(record: &TerminalRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    /// Concise output: destination, score and why
    pub fn format_summary(record: &TerminalRecord) -> String {
        let TerminalRecord::Analyzed(result) = record else {
            return Self::format(record);
        };

        let mut output = format!(
            "{} {} {}\n",
            Self::queue_label(result.destination()),
            "Task".bold(),
            result.task_id
        );
        if let Some(path) = &result.path {
            output.push_str(&format!("  {} {}\n", "File:".dimmed(), path));
        }
        output.push_str(&format!(
            "  {} {:.2}  {}\n",
            "Score:".cyan().bold(),
            result.score(),
            result.routing.reason
        ));
        output.push_str(&Self::disagreements(result));
        output
    }

    /// Totals for a finished (or abandoned) batch
    pub fn format_batch_summary(status: &BatchStatus, elapsed: Duration) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Batch Summary"));
        output.push('\n');
        output.push_str(&format!(
            "  {} {}\n",
            "Completed:".green().bold(),
            status.count(TerminalQueue::Completed)
        ));
        output.push_str(&format!(
            "  {} {}\n",
            "Review:".yellow().bold(),
            status.count(TerminalQueue::Review)
        ));
        output.push_str(&format!(
            "  {} {}\n",
            "Failed:".red().bold(),
            status.count(TerminalQueue::Failed)
        ));
        if !status.outstanding.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                "Unresolved:".magenta().bold(),
                status.outstanding.len()
            ));
            for id in &status.outstanding {
                output.push_str(&format!("    - {}\n", id));
            }
        }
        output.push_str(&format!(
            "  {} {:.1}s\n",
            "Total time:".cyan().bold(),
            elapsed.as_secs_f64()
        ));
        output.push_str(&Self::footer());
        output
    }

    /// One line per queue
    pub fn format_counts(counts: &QueueCounts) -> String {
        format!(
            "{} pending {} | processing {} | completed {} | review {} | failed {}",
            "Queues:".dimmed(),
            counts.pending,
            counts.processing,
            counts.completed,
            counts.review,
            counts.failed
        )
    }

    fn overview(result: &TaskResult) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n",
            "Destination:".cyan().bold(),
            Self::queue_label(result.destination())
        ));
        output.push_str(&format!("{} {}\n", "Reason:".cyan().bold(), result.routing.reason));
        output.push_str(&format!(
            "{} {:.2}\n",
            "Score:".cyan().bold(),
            result.score()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Gate:".cyan().bold(),
            Self::gate_label(result.cross_validation.status)
        ));
        output.push_str(&format!(
            "{} {} ({})\n",
            "Source:".cyan().bold(),
            result.source,
            result.orchestrator
        ));
        if let Some(path) = &result.path {
            output.push_str(&format!("{} {}\n", "File:".cyan().bold(), path));
        }
        let failed = result.waves.failed_count();
        if failed > 0 {
            output.push_str(&format!(
                "{} {} of {} agents failed\n",
                "Warning:".yellow().bold(),
                failed,
                result.waves.outcome_count()
            ));
        }
        output
    }

    fn disagreements(result: &TaskResult) -> String {
        let cross_validation = &result.cross_validation;
        let mut output = String::new();
        if !cross_validation.disagreements.is_empty() {
            output.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
            for disagreement in &cross_validation.disagreements {
                output.push_str(&format!(
                    "  * line {}: {}\n",
                    disagreement.line,
                    disagreement.detector_concerns.join(", ")
                ));
            }
        }
        if !cross_validation.missing.is_empty() {
            let missing: Vec<String> =
                cross_validation.missing.iter().map(|a| a.to_string()).collect();
            output.push_str(&format!(
                "\n{} {}\n",
                "Gate agents missing:".yellow().bold(),
                missing.join(", ")
            ));
        }
        output
    }

    fn queue_label(queue: TerminalQueue) -> ColoredString {
        let label = format!("[{}]", queue.as_str().to_uppercase());
        match queue {
            TerminalQueue::Completed => label.green().bold(),
            TerminalQueue::Review => label.yellow().bold(),
            TerminalQueue::Failed => label.red().bold(),
        }
    }

    fn gate_label(status: GateStatus) -> ColoredString {
        match status {
            GateStatus::Clear => status.as_str().green(),
            GateStatus::ReviewRequired => status.as_str().yellow(),
            GateStatus::Incomplete => status.as_str().magenta(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_full(&self, record: &TerminalRecord) -> String {
        Self::format(record)
    }

    fn format_json(&self, record: &TerminalRecord) -> String {
        Self::format_json(record)
    }

    fn format_summary(&self, record: &TerminalRecord) -> String {
        Self::format_summary(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use swarm_domain::core::clock::now;
    use swarm_domain::{
        CompositeScore, CrossValidation, Disagreement, OutputFormat, RoutingDecision,
        RoutingReason, TaskId, WaveTable,
    };

    fn review_result() -> TaskResult {
        TaskResult {
            task_id: TaskId::new("task-1"),
            source: "cli".into(),
            path: Some("session.txt".into()),
            orchestrator: "cli-00000001".into(),
            processed_at: now(),
            waves: WaveTable::new(),
            cross_validation: CrossValidation {
                status: GateStatus::ReviewRequired,
                disagreements: vec![Disagreement {
                    line: 4,
                    detector_concerns: vec!["boundary_language".into()],
                    requires_review: true,
                }],
                missing: vec![],
                checked_at: now(),
            },
            composite_score: CompositeScore {
                value: 8.75,
                dimensions: vec![],
            },
            routing: RoutingDecision {
                destination: TerminalQueue::Review,
                reason: RoutingReason::GateDisagreement { lines: vec![4] },
            },
        }
    }

    #[test]
    fn test_summary_shows_destination_and_disagreement() {
        let record = TerminalRecord::Analyzed(review_result());
        let text = ConsoleFormatter.render(&record, OutputFormat::Summary);
        assert!(text.contains("REVIEW"));
        assert!(text.contains("8.75"));
        assert!(text.contains("line 4: boundary_language"));
        assert!(text.contains("session.txt"));
    }

    #[test]
    fn test_json_round_trips_the_record() {
        let record = TerminalRecord::Analyzed(review_result());
        let text = ConsoleFormatter.render(&record, OutputFormat::Json);
        let parsed: TerminalRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_failure_record_shows_error() {
        let record = TerminalRecord::Failed(FailureRecord {
            task_id: None,
            error: "expected value at line 1 column 1".into(),
            raw_preview: "not a task".into(),
            orchestrator: "cli-00000001".into(),
            failed_at: now(),
        });
        let text = ConsoleFormatter::format_summary(&record);
        assert!(text.contains("FAILED"));
        assert!(text.contains("<unknown>"));
        assert!(text.contains("not a task"));
    }

    #[test]
    fn test_batch_summary_counts_each_queue() {
        let mut resolved = HashMap::new();
        resolved.insert(
            TaskId::new("task-1"),
            TerminalRecord::Analyzed(review_result()),
        );
        let status = BatchStatus {
            resolved,
            outstanding: vec![TaskId::new("task-2")],
        };
        let text = ConsoleFormatter::format_batch_summary(&status, Duration::from_millis(2500));
        assert!(text.contains("Review:"));
        assert!(text.contains("task-2"));
        assert!(text.contains("2.5s"));
    }
}
