//! Agent implementations
//!
//! Every catalog agent is a [`VocabularyAgent`] parameterized by its profile.

mod vocabulary_agent;

pub use vocabulary_agent::{VocabularyAgent, default_registry};
