//! Per-task wave result table and the context handed to agents.
//!
//! The table replaces a flat string-keyed context map: results are indexed by
//! wave and agent, and [`context_key`] reproduces the flat `wave_<n>_<agent>`
//! naming for consumers that want it.

mod context;
mod table;

pub use context::AnalysisContext;
pub use table::{WaveTable, context_key};
