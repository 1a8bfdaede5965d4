//! Batch result export
//!
//! Writes one pretty-printed `<task_id>.json` per resolved task plus a
//! `summary.json` into a fresh `batch_<YYYYmmdd_HHMMSS>` directory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use swarm_application::BatchStatus;
use swarm_domain::{TaskId, TerminalQueue};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub timestamp: String,
    pub total_tasks: usize,
    pub completed: usize,
    pub review: usize,
    pub failed: usize,
    pub outstanding: Vec<TaskId>,
    pub elapsed_secs: f64,
    pub task_ids: Vec<TaskId>,
    pub output_directory: PathBuf,
}

/// Exports batch results below a parent directory
pub struct BatchExporter {
    root: PathBuf,
}

impl BatchExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write every resolved record and the summary. Returns the batch directory.
    pub fn export(
        &self,
        task_ids: &[TaskId],
        status: &BatchStatus,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, ExportError> {
        let timestamp = at.format("%Y%m%d_%H%M%S").to_string();
        let batch_dir = self.root.join(format!("batch_{timestamp}"));
        create_dir(&batch_dir)?;

        for id in task_ids {
            if let Some(record) = status.resolved.get(id) {
                let json = serde_json::to_string_pretty(record)?;
                write(&batch_dir.join(format!("{id}.json")), &json)?;
            }
        }

        let summary = BatchSummary {
            timestamp,
            total_tasks: task_ids.len(),
            completed: status.count(TerminalQueue::Completed),
            review: status.count(TerminalQueue::Review),
            failed: status.count(TerminalQueue::Failed),
            outstanding: status.outstanding.clone(),
            elapsed_secs,
            task_ids: task_ids.to_vec(),
            output_directory: batch_dir.clone(),
        };
        write(
            &batch_dir.join("summary.json"),
            &serde_json::to_string_pretty(&summary)?,
        )?;

        info!(directory = %batch_dir.display(), tasks = task_ids.len(), "Results exported");
        Ok(batch_dir)
    }
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
