//! CLI entrypoint for research-swarm
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use swarm_application::{
    AuditLogger, BatchStatus, NoAudit, NoProgress, Orchestrator, ProcessTaskUseCase, QueueStore,
    RunWavesUseCase, TaskQueueClient, WaveProgressNotifier,
};
use swarm_domain::core::clock::{format_timestamp, now};
use swarm_domain::{OutputFormat, Task, TaskId};
use swarm_infrastructure::{
    BatchExporter, ConfigLoader, FileConfig, InMemoryQueueStore, JsonlAuditLogger,
    RedisQueueStore, default_registry,
};
use swarm_presentation::{
    BatchProgress, Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on waiting for a batch when `--timeout` is not given
const DEFAULT_WAIT: Duration = Duration::from_secs(24 * 60 * 60);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _log_guard = init_logging(cli.verbose, config.logging.directory.as_deref())?;

    info!("Starting research-swarm");

    let warnings = config.ensure_valid()?;
    for issue in &warnings {
        warn!(code = ?issue.code, "{}", issue.message);
        eprintln!("{} {}", "warning:".yellow().bold(), issue.message);
    }

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    if cli.transcripts.is_empty() {
        bail!("No transcripts given. Pass one or more transcript files.");
    }

    match config.store.url() {
        Some(url) => {
            let store = RedisQueueStore::connect(url)
                .await
                .context("Failed to connect to the shared store")?;
            run_batch(&cli, &config, Arc::new(store)).await
        }
        None => {
            info!("No store.url configured, coordinating instances in this process only");
            run_batch(&cli, &config, Arc::new(InMemoryQueueStore::new())).await
        }
    }
}

/// Merge the config file chain with command-line overrides.
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };

    if let Some(instances) = cli.instances {
        config.orchestrator.instances = instances;
    }
    if let Some(namespace) = &cli.namespace {
        config.queues.namespace = namespace.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.directory = Some(dir.clone());
    }
    if let Some(format) = cli.output {
        config.output.format = Some(format.into());
    }
    if let Some(dir) = &cli.output_dir {
        config.output.export_dir = dir.clone();
    }
    if let Some(url) = &cli.store_url {
        config.store.url = Some(url.clone());
    }
    Ok(config)
}

/// Console logging filtered by `-v`, plus daily files when a directory is set.
///
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(verbose: u8, directory: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "research-swarm.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn read_tasks(cli: &Cli, kind: &str) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(cli.transcripts.len());
    for path in &cli.transcripts {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        let mut task = Task::new(text)
            .with_source(kind)
            .with_path(path.display().to_string())
            .with_context_value("orchestrator", serde_json::json!(kind))
            .with_context_value("timestamp", serde_json::json!(format_timestamp(&now())));
        if cli.auto_approve {
            task = task.with_context_value("auto_approve", serde_json::json!(true));
        }
        if cli.production {
            task = task.with_context_value("production_mode", serde_json::json!(true));
        }
        tasks.push(task);
    }
    Ok(tasks)
}

async fn run_batch<S: QueueStore + 'static>(
    cli: &Cli,
    config: &FileConfig,
    store: Arc<S>,
) -> Result<()> {
    let format = config.output.format.unwrap_or_default();
    let show_progress = !cli.quiet && format != OutputFormat::Json;

    // === Dependency Injection ===
    let audit: Arc<dyn AuditLogger> = match config.logging.audit_path() {
        Some(path) => Arc::new(
            JsonlAuditLogger::open(&path)
                .with_context(|| format!("Failed to open audit log {}", path.display()))?,
        ),
        None => Arc::new(NoAudit),
    };

    let (disabled, _) = config.agents.parse_disabled();
    let registry = Arc::new(default_registry(&disabled, Arc::clone(&audit)));
    let params = config.orchestrator_params();
    let tasks = read_tasks(cli, params.kind.as_str()).await?;
    let process = ProcessTaskUseCase::new(
        RunWavesUseCase::new(registry).with_agent_timeout(params.agent_timeout),
        config.evaluation(),
    );

    // Bars only on a terminal; plain lines when piped
    let reporter = (show_progress && std::io::stdout().is_terminal())
        .then(|| Arc::new(ProgressReporter::new()));
    let progress: Arc<dyn WaveProgressNotifier> = match &reporter {
        Some(reporter) => Arc::clone(reporter) as Arc<dyn WaveProgressNotifier>,
        None if show_progress => Arc::new(SimpleProgress),
        None => Arc::new(NoProgress),
    };

    let client = TaskQueueClient::new(Arc::clone(&store), params.keys.clone());

    let cancel = CancellationToken::new();
    let handles: Vec<JoinHandle<_>> = (0..config.orchestrator.instances)
        .map(|_| {
            let orchestrator = Arc::new(
                Orchestrator::new(Arc::clone(&store), process.clone(), params.clone())
                    .with_audit(Arc::clone(&audit))
                    .with_progress(Arc::clone(&progress)),
            );
            info!(instance = %orchestrator.id(), "Spawning orchestrator");
            tokio::spawn(orchestrator.run(cancel.clone()))
        })
        .collect();

    let mut feed = client.subscribe_vocabulary().await?;
    let vocabulary = tokio::spawn(async move {
        while let Some(broadcast) = feed.next().await {
            info!(
                source = %broadcast.source_instance,
                updates = broadcast.updates.len(),
                "Vocabulary update"
            );
        }
    });

    // === Submission ===
    let ids = client.submit_batch(&tasks).await?;
    info!(tasks = ids.len(), instances = handles.len(), "Batch submitted");

    if show_progress {
        println!(
            "{} {} transcript(s) across {} instance(s)\n",
            "Analyzing".cyan().bold(),
            ids.len(),
            handles.len()
        );
    }

    // === Monitoring ===
    let started = Instant::now();
    let batch = match &reporter {
        Some(reporter) => BatchProgress::attached(reporter, ids.len()),
        None => BatchProgress::hidden(ids.len()),
    };
    let timeout = cli.wait_timeout().unwrap_or(DEFAULT_WAIT);
    let status = tokio::select! {
        status = client.wait_for(&ids, timeout, POLL_INTERVAL, |status| batch.update(status)) => status?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, collecting finished results");
            client.batch_status(&ids).await?
        }
    };
    batch.finish();
    let elapsed = started.elapsed();

    // === Shutdown ===
    cancel.cancel();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Orchestrator stopped with error"),
            Err(e) => warn!(error = %e, "Orchestrator task panicked"),
        }
    }
    vocabulary.abort();

    // === Output ===
    print_results(&ids, &status, format);
    let summary = ConsoleFormatter::format_batch_summary(&status, elapsed);
    if format == OutputFormat::Json {
        eprintln!("{}", summary);
    } else {
        println!("{}", summary);
    }

    if cli.wants_export() {
        let dir = export(&config.output.export_dir, &ids, &status, elapsed)?;
        println!("{} {}", "Exported to".green().bold(), dir.display());
    }

    if !status.outstanding.is_empty() {
        bail!("{} task(s) did not resolve", status.outstanding.len());
    }
    Ok(())
}

fn print_results(ids: &[TaskId], status: &BatchStatus, format: OutputFormat) {
    let records: Vec<_> = ids.iter().filter_map(|id| status.resolved.get(id)).collect();
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string());
        println!("{}", json);
        return;
    }
    for record in records {
        println!("{}", ConsoleFormatter.render(record, format));
    }
}

fn export(root: &Path, ids: &[TaskId], status: &BatchStatus, elapsed: Duration) -> Result<PathBuf> {
    let dir = BatchExporter::new(root).export(ids, status, elapsed.as_secs_f64(), now())?;
    info!(dir = %dir.display(), "Exported batch");
    Ok(dir)
}
