//! Pull request description drafts

use serde::{Deserialize, Serialize};

/// PR description returned by the model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrDescriptionGeneration {
    /// Markdown body following the PR template
    pub description: String,
    /// Replacement PR title, only requested with `--generate-title`
    #[serde(default)]
    pub title: Option<String>,
}

impl PrDescriptionGeneration {
    pub fn validated(mut self, require_title: bool) -> Result<Self, String> {
        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            return Err("The \"description\" field must not be empty".to_string());
        }

        self.title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if require_title && self.title.is_none() {
            return Err("A non-empty \"title\" field is required".to_string());
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_required_when_requested() {
        let draft = PrDescriptionGeneration {
            description: "Adds caching".to_string(),
            title: Some("  ".to_string()),
        };
        assert!(draft.clone().validated(true).is_err());
        let ok = draft.validated(false).expect("valid");
        assert_eq!(ok.title, None);
    }

    #[test]
    fn test_empty_description_rejected() {
        let draft = PrDescriptionGeneration {
            description: "\n".to_string(),
            title: Some("Title".to_string()),
        };
        assert!(draft.validated(false).is_err());
    }
}
