//! Port for the structured audit trail.
//!
//! Records coordination events (claims, routing decisions, failovers,
//! lease reclaims) and agent security events to a machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures an append-only
//! record an operator can replay after an incident.

use serde_json::Value;

/// A structured audit event.
///
/// Each event has a type string and a JSON payload; the adapter adds the
/// timestamp when it writes the record.
pub struct AuditEvent {
    /// Event type identifier (e.g., "task_claimed", "peer_failover").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for recording audit events.
///
/// `log` is synchronous and infallible: a broken audit sink must never fail
/// or stall a task.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAudit;

impl AuditLogger for NoAudit {
    fn log(&self, _event: AuditEvent) {}
}
