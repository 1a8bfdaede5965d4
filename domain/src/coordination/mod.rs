//! Shared-store coordination vocabulary: key names, instance identity and
//! the liveness record each orchestrator keeps fresh.

mod keys;
mod registration;

pub use keys::QueueKeys;
pub use registration::{InstanceId, InstanceStatus, OrchestratorKind, OrchestratorRegistration};
