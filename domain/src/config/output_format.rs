//! Output format value object

use serde::{Deserialize, Serialize};

/// How task results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every wave and agent
    Full,
    /// Score, routing and disagreements only (default)
    #[default]
    Summary,
    /// JSON output
    Json,
}
