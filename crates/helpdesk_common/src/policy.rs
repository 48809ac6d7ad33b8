//! Policy document types.

use serde::{Deserialize, Serialize};

/// An IT policy document loaded from the policy directory.
///
/// The name is derived from the filename ("password_reset.txt" becomes
/// "Password Reset"); the content is the raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub content: String,
}

/// A policy scored against a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyMatch {
    pub policy: Policy,
    /// Number of distinct question keywords found in the policy text
    pub score: usize,
    /// Paragraphs of the policy that contain at least one keyword,
    /// capped so prompts stay small
    pub excerpts: Vec<String>,
}

impl PolicyMatch {
    pub fn name(&self) -> &str {
        &self.policy.name
    }
}
