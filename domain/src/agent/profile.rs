//! Declarative agent profile.
//!
//! An [`AgentProfile`] is everything that distinguishes one analysis agent
//! from another: its wave, its permission tier, and its vocabulary table.
//! A single parameterized implementation turns a profile into a running agent.

use super::value_objects::{AgentId, PermissionTier, Wave};
use serde::{Deserialize, Serialize};

/// One vocabulary category and the terms that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyCategory {
    pub name: String,
    pub terms: Vec<String>,
}

impl VocabularyCategory {
    pub fn new(name: impl Into<String>, terms: &[&str]) -> Self {
        Self {
            name: name.into(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Static description of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub wave: Wave,
    pub tier: PermissionTier,
    pub description: String,
    /// Categories are scanned in declaration order.
    pub vocabulary: Vec<VocabularyCategory>,
}

impl AgentProfile {
    pub fn new(
        id: AgentId,
        wave: Wave,
        tier: PermissionTier,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            wave,
            tier,
            description: description.into(),
            vocabulary: Vec::new(),
        }
    }

    pub fn with_category(mut self, name: &str, terms: &[&str]) -> Self {
        self.vocabulary.push(VocabularyCategory::new(name, terms));
        self
    }

    /// Total number of terms across all categories.
    pub fn term_count(&self) -> usize {
        self.vocabulary.iter().map(|c| c.terms.len()).sum()
    }
}
