use crate::core::clock::{format_timestamp, parse_timestamp};
use crate::core::error::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Flavor of orchestrator. Both run the same protocol; the kind is recorded
/// so operators can tell batch workers from editor-attached ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorKind {
    #[default]
    Cli,
    Vscode,
}

impl OrchestratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorKind::Cli => "cli",
            OrchestratorKind::Vscode => "vscode",
        }
    }
}

impl std::fmt::Display for OrchestratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrchestratorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cli" => Ok(OrchestratorKind::Cli),
            "vscode" => Ok(OrchestratorKind::Vscode),
            other => Err(DomainError::UnknownOrchestratorKind(other.to_string())),
        }
    }
}

/// `<kind>-<8 hex chars>`, e.g. `cli-3f9a01bc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn generate(kind: OrchestratorKind) -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", kind, &hex[..8]))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Active,
    Stopped,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Active => "active",
            InstanceStatus::Stopped => "stopped",
        }
    }
}

/// Liveness record stored as a hash under `orchestrators:<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorRegistration {
    pub id: InstanceId,
    pub kind: OrchestratorKind,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub status: InstanceStatus,
}

impl OrchestratorRegistration {
    pub fn new(id: InstanceId, kind: OrchestratorKind, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            started_at: now,
            last_heartbeat: now,
            status: InstanceStatus::Active,
        }
    }

    /// Hash fields in the stored layout.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("type".to_string(), self.kind.as_str().to_string()),
            ("started_at".to_string(), format_timestamp(&self.started_at)),
            (
                "last_heartbeat".to_string(),
                format_timestamp(&self.last_heartbeat),
            ),
            ("status".to_string(), self.status.as_str().to_string()),
        ]
    }

    pub fn from_fields(
        id: InstanceId,
        fields: &HashMap<String, String>,
    ) -> Result<Self, DomainError> {
        let malformed = |reason: &str| DomainError::MalformedRegistration {
            instance: id.to_string(),
            reason: reason.to_string(),
        };
        let timestamp = |name: &str| {
            fields
                .get(name)
                .and_then(|s| parse_timestamp(s))
                .ok_or_else(|| malformed(&format!("missing or invalid {name}")))
        };

        let kind = fields
            .get("type")
            .ok_or_else(|| malformed("missing type"))?
            .parse::<OrchestratorKind>()?;
        let started_at = timestamp("started_at")?;
        let last_heartbeat = timestamp("last_heartbeat")?;
        let status = match fields.get("status").map(String::as_str) {
            Some("stopped") => InstanceStatus::Stopped,
            _ => InstanceStatus::Active,
        };

        Ok(Self {
            id,
            kind,
            started_at,
            last_heartbeat,
            status,
        })
    }

    /// Heartbeat older than `timeout` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_heartbeat > timeout
    }
}
