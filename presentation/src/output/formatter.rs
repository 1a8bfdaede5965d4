//! Output formatter trait

use swarm_domain::{OutputFormat, TerminalRecord};

/// Trait for formatting terminal records
pub trait OutputFormatter {
    /// Every wave and agent
    fn format_full(&self, record: &TerminalRecord) -> String;

    /// Format as JSON
    fn format_json(&self, record: &TerminalRecord) -> String;

    /// Score, routing and disagreements only
    fn format_summary(&self, record: &TerminalRecord) -> String;

    fn render(&self, record: &TerminalRecord, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format_full(record),
            OutputFormat::Summary => self.format_summary(record),
            OutputFormat::Json => self.format_json(record),
        }
    }
}
