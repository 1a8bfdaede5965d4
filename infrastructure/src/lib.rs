//! Infrastructure layer for research-swarm
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod agents;
pub mod config;
pub mod export;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use agents::{VocabularyAgent, default_registry};
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentsConfig, FileConfig, FileLoggingConfig,
    FileOrchestratorConfig, FileOutputConfig, FileOutputFormat, FileQueuesConfig,
    FileRoutingConfig, FileScoringConfig, FileStoreConfig,
};
pub use export::{BatchExporter, BatchSummary, ExportError};
pub use logging::JsonlAuditLogger;
pub use store::{InMemoryQueueStore, RedisQueueStore};
