//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use swarm_domain::OutputFormat;

/// Output format for task results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOutputFormat {
    /// Every wave and agent
    Full,
    /// Score, routing and disagreements only
    Summary,
    /// JSON output
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Full => OutputFormat::Full,
            CliOutputFormat::Summary => OutputFormat::Summary,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for research-swarm
#[derive(Parser, Debug)]
#[command(name = "research-swarm")]
#[command(author, version, about = "Wave-based transcript analysis swarm")]
#[command(long_about = r#"
research-swarm analyzes therapy-session transcripts with a swarm of
vocabulary agents and routes each result to completed, review or failed.

Each transcript becomes one task. Orchestrator instances claim tasks from
a shared queue and run four waves of agents:
1. Forensic accuracy and verbatim preservation
2. Eleven parallel domain analysts
3. Validators, including the risk detector / legitimacy validator pair
4. Integration synthesis

Any disagreement between the detector and the validator sends the task to
human review, regardless of its score.

Configuration files are loaded from (in priority order):
1. SWARM_* environment variables
2. --config <path>     Explicit config file
3. ./swarm.toml        Project-level config
4. ~/.config/research-swarm/config.toml   Global config

Without a store URL all instances share one in-process queue. With
--store-url (or [store] url) every process pointed at the same Redis
server shares its queues, and a crashed process's tasks are recovered by
the survivors.

Example:
  research-swarm session-01.txt session-02.txt
  research-swarm -n 4 --export transcripts/*.txt
  research-swarm -o json --namespace staging session.txt
  research-swarm --store-url redis://localhost:6379 session.txt
"#)]
pub struct Cli {
    /// Transcript files to analyze, one task per file
    #[arg(value_name = "TRANSCRIPT")]
    pub transcripts: Vec<PathBuf>,

    /// Number of orchestrator instances to run
    #[arg(short = 'n', long, value_name = "N")]
    pub instances: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<CliOutputFormat>,

    /// Write every result and a summary under the export directory
    #[arg(long)]
    pub export: bool,

    /// Parent directory for exported batches (implies --export)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Give up waiting for results after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Prefix for every queue key
    #[arg(long, value_name = "NAME")]
    pub namespace: Option<String>,

    /// Redis server shared with other research-swarm processes
    #[arg(long, value_name = "URL")]
    pub store_url: Option<String>,

    /// Mark submitted tasks as pre-approved
    #[arg(long)]
    pub auto_approve: bool,

    /// Mark submitted tasks as production runs
    #[arg(long)]
    pub production: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Directory for rolling log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    pub fn wants_export(&self) -> bool {
        self.export || self.output_dir.is_some()
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
