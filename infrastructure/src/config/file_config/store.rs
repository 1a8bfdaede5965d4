//! Shared store selection from TOML (`[store]` section)

use serde::{Deserialize, Serialize};
use swarm_domain::{ConfigIssue, ConfigIssueCode};

const SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "unix://"];

/// Raw store configuration from TOML
///
/// ```toml
/// [store]
/// url = "redis://localhost:6379/0"
/// ```
///
/// Without a URL every instance runs against one in-process store, which
/// only coordinates instances inside this process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Redis server shared by every orchestrator process
    pub url: Option<String>,
}

impl FileStoreConfig {
    /// The configured URL, ignoring a blank value.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        match self.url() {
            Some(url) if !SCHEMES.iter().any(|s| url.starts_with(s)) => {
                vec![ConfigIssue::error(
                    ConfigIssueCode::UnsupportedStoreUrl,
                    format!(
                        "store.url must start with one of {}, got {url:?}",
                        SCHEMES.join(", ")
                    ),
                )]
            }
            _ => Vec::new(),
        }
    }
}
