//! Jira ticket drafts

use serde::{Deserialize, Serialize};

/// Ticket content returned by the model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TicketGeneration {
    /// One-line summary, ideally 15 words or fewer
    pub summary: String,
    pub description: String,
    /// Jira issue type name
    #[serde(default)]
    pub issuetype: String,
}

impl TicketGeneration {
    /// Checks required fields and settles the issue type.
    ///
    /// An issue type the project does not offer is replaced by `fallback_type`.
    pub fn validated(mut self, allowed_types: &[String], fallback_type: &str) -> Result<Self, String> {
        self.summary = self.summary.trim().to_string();
        self.description = self.description.trim().to_string();

        if self.summary.is_empty() || self.description.is_empty() {
            return Err("Both \"summary\" and \"description\" must be non-empty".to_string());
        }

        let chosen = allowed_types
            .iter()
            .find(|t| t.eq_ignore_ascii_case(self.issuetype.trim()))
            .cloned();
        self.issuetype = chosen.unwrap_or_else(|| fallback_type.to_string());
        Ok(self)
    }
}
