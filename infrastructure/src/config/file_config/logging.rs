//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// directory = "~/.local/state/research-swarm/logs"
/// audit_file = "audit.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Daily-rolling operation logs go here when set
    pub directory: Option<PathBuf>,
    /// JSONL audit trail; relative paths resolve against `directory`
    pub audit_file: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// Where the audit trail should be written, if anywhere.
    pub fn audit_path(&self) -> Option<PathBuf> {
        let file = self.audit_file.as_ref()?;
        match &self.directory {
            Some(dir) if file.is_relative() => Some(dir.join(file)),
            _ => Some(file.clone()),
        }
    }
}
