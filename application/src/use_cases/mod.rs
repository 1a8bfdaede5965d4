//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod client;
pub mod orchestrator;
pub mod process_task;
pub mod run_waves;
