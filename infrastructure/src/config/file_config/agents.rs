//! Agent configuration from TOML (`[agents]` section)

use serde::{Deserialize, Serialize};
use swarm_domain::{AgentId, ConfigIssue, ConfigIssueCode};

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agents]
/// disabled = ["research_connector"]
/// ```
///
/// Disabled agents are not loaded; their wave runs without them and any
/// score dimension they feed counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    /// Agent ids to leave out of the registry
    pub disabled: Vec<String>,
}

impl FileAgentsConfig {
    /// Parse the disabled list, returning warnings for unknown ids.
    pub fn parse_disabled(&self) -> (Vec<AgentId>, Vec<ConfigIssue>) {
        let mut ids = Vec::new();
        let mut issues = Vec::new();
        for name in &self.disabled {
            match name.parse::<AgentId>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownAgent,
                    format!("agents.disabled: unknown agent '{name}', ignoring"),
                )),
            }
        }
        (ids, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_disabled() {
        let config = FileAgentsConfig {
            disabled: vec![
                "somatic_awareness".into(),
                "Somatic_Awareness".into(),
                "mystery".into(),
            ],
        };
        let (ids, issues) = config.parse_disabled();
        assert_eq!(ids, vec![AgentId::SomaticAwareness]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownAgent);
    }
}
