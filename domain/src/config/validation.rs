//! Configuration validation issues.
//!
//! Validators return every issue they find instead of stopping at the first
//! one, so a single run can report all problems in a config file.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// Scoring weights do not add up to 1.0.
    WeightsDoNotSumToOne,
    /// A scoring weight or the gap penalty is negative.
    NegativeWeight,
    /// An interval or timeout is zero.
    ZeroDuration,
    /// Heartbeat timeout is under twice the heartbeat interval.
    HeartbeatTimeoutTooShort,
    /// Heartbeat timeout is under three times the interval; false failovers
    /// become likely under load.
    HeartbeatTimeoutTight,
    /// A routing threshold is outside 0..=10.
    ThresholdOutOfRange,
    /// The publish threshold is below the acceptance threshold.
    PublishBelowAcceptance,
    /// `agents.disabled` names an agent that does not exist.
    UnknownAgent,
    /// `store.url` is not a Redis connection URL.
    UnsupportedStoreUrl,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// Returns `true` if any issue is an error.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_returns_true_for_errors() {
        let issues = vec![
            ConfigIssue::warning(ConfigIssueCode::HeartbeatTimeoutTight, "tight"),
            ConfigIssue::error(ConfigIssueCode::WeightsDoNotSumToOne, "sum"),
        ];
        assert!(has_errors(&issues));
    }

    #[test]
    fn has_errors_returns_false_for_warnings_only() {
        let issues = vec![ConfigIssue::warning(ConfigIssueCode::UnknownAgent, "x")];
        assert!(!has_errors(&issues));
    }

    #[test]
    fn has_errors_returns_false_for_empty() {
        let issues: Vec<ConfigIssue> = vec![];
        assert!(!has_errors(&issues));
    }
}
