//! Presentation layer for research-swarm
//!
//! This crate contains the CLI definition, console formatting of task
//! results and batch summaries, and progress reporting.

pub mod cli;
pub mod output;
pub mod progress;

pub use cli::commands::{Cli, CliOutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use progress::reporter::{BatchProgress, ProgressReporter, SimpleProgress};
