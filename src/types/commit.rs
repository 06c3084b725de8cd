//! Commit message types and formatting

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator between the commit type and the title
pub const TITLE_SEPARATOR: char = ':';

/// Commit draft returned by the model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommitGeneration {
    /// Short imperative title, without the type prefix
    pub title: String,
    /// Detailed commit message body
    #[serde(default)]
    pub body: String,
    /// Conventional commit type (`feat`, `fix`, `chore`...)
    #[serde(rename = "type")]
    pub commit_type: String,
}

impl CommitGeneration {
    /// Checks the draft and normalizes its title.
    ///
    /// The error string is fed back to the model on retry.
    pub fn validated(mut self) -> Result<Self, String> {
        self.commit_type = self.commit_type.trim().to_lowercase();
        if self.commit_type.is_empty() {
            return Err("The \"type\" field must not be empty".to_string());
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err("The \"title\" field must not be empty".to_string());
        }

        let separators = title.matches(TITLE_SEPARATOR).count();
        if separators > 1 {
            return Err(format!(
                "The title \"{title}\" contains {separators} '{TITLE_SEPARATOR}' characters; use at most one"
            ));
        }

        let stripped = strip_type_prefix(title, &self.commit_type).trim().to_string();
        if stripped.is_empty() {
            return Err(format!("The title \"{title}\" only contains the commit type"));
        }

        self.title = capitalize_first(&stripped);
        self.body = self.body.trim().to_string();
        Ok(self)
    }

    /// `type: Title`
    pub fn title_line(&self) -> String {
        format!("{}{TITLE_SEPARATOR} {}", self.commit_type, self.title)
    }

    /// Full commit message with the body wrapped at 78 columns
    pub fn message(&self) -> String {
        let mut message = self.title_line();
        if self.body.is_empty() {
            return message;
        }

        message.push_str("\n\n");
        for paragraph in self.body.split('\n') {
            if paragraph.trim().is_empty() {
                message.push('\n');
                continue;
            }
            for line in textwrap::wrap(paragraph, 78) {
                message.push_str(&line);
                message.push('\n');
            }
        }
        message.trim_end().to_string()
    }
}

/// Removes a leading `type:` / `type(scope):` / `type!:` that repeats the commit type
fn strip_type_prefix<'a>(title: &'a str, commit_type: &str) -> &'a str {
    let pattern = format!(r"(?i)^{}(\([^)]*\))?!?\s*:\s*", regex::escape(commit_type));
    match Regex::new(&pattern) {
        Ok(re) => match re.find(title) {
            Some(m) => &title[m.end()..],
            None => title,
        },
        Err(_) => title,
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
