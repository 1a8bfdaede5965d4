//! Agent domain module
//!
//! Agents are declarative: an [`AgentProfile`] from the [`catalog`] plus the
//! shared [`scan`] routine is all it takes to analyze a transcript.

pub mod catalog;
pub mod profile;
pub mod result;
pub mod sanitize;
pub mod scan;
pub mod value_objects;

pub use profile::{AgentProfile, VocabularyCategory};
pub use result::{AgentOutcome, AgentResult, Finding, Pattern, PatternStrength};
pub use sanitize::{InputRejection, sanitize_input};
pub use scan::{ScanOutcome, scan_vocabulary};
pub use value_objects::{AgentId, PermissionTier, Wave};
