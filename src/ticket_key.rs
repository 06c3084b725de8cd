//! Jira ticket identifiers in free text.
//!
//! The canonical form is `KEY-123`; PR bodies and commit messages carry the
//! bracketed display form `[KEY-123]`.

use crate::error::GluError;

use regex::Regex;
use std::fmt::{self, Display};

/// Renders `KEY-N` (or `[KEY-N]`); `ticket` must parse as a base-10 integer
pub fn format_ticket<T>(project_key: &str, ticket: T, with_brackets: bool) -> Result<String, GluError>
where
    T: Display,
{
    let raw = ticket.to_string();
    let number: i64 = raw
        .trim()
        .parse()
        .map_err(|_| GluError::InvalidTicketNumber(raw.clone()))?;

    let key = format!("{project_key}-{number}");
    Ok(if with_brackets { format!("[{key}]") } else { key })
}

fn loose_pattern(project_key: &str) -> Option<Regex> {
    Regex::new(&format!(r"\[?{}-[A-Za-z0-9]+\]?", regex::escape(project_key))).ok()
}

/// First loosely-typed ticket reference (`KEY-12`, `[KEY-12]`, `KEY-12]`...) in `text`
pub fn find_ticket_key<'t>(text: &'t str, project_key: &str) -> Option<&'t str> {
    if project_key.is_empty() {
        return None;
    }
    loose_pattern(project_key)?.find(text).map(|m| m.as_str())
}

fn number_part<'t>(found: &'t str, project_key: &str) -> Option<&'t str> {
    found
        .trim_start_matches('[')
        .trim_end_matches(']')
        .strip_prefix(project_key)?
        .strip_prefix('-')
}

/// Number part of the first ticket reference found in `text`
pub fn find_ticket_number(text: &str, project_key: &str) -> Option<String> {
    let found = find_ticket_key(text, project_key)?;
    number_part(found, project_key).map(str::to_string)
}

/// Number parts of every ticket reference in `text`, in order of appearance
pub fn find_ticket_numbers(text: &str, project_key: &str) -> Vec<String> {
    if project_key.is_empty() {
        return Vec::new();
    }
    let Some(re) = loose_pattern(project_key) else {
        return Vec::new();
    };
    re.find_iter(text)
        .filter_map(|m| number_part(m.as_str(), project_key))
        .map(str::to_string)
        .collect()
}

/// Puts the canonical `[KEY-N]` into `text` exactly once.
///
/// Already present: unchanged. A loose reference present: that occurrence is
/// replaced. Otherwise the key is appended as a trailing paragraph.
pub fn inject_ticket_key<T>(text: &str, project_key: &str, ticket: T) -> Result<String, GluError>
where
    T: Display,
{
    let bracketed = format_ticket(project_key, ticket, true)?;
    Ok(inject_bracketed(text, project_key, &bracketed))
}

fn inject_bracketed(text: &str, project_key: &str, bracketed: &str) -> String {
    if text.contains(bracketed) {
        return text.to_string();
    }

    if let Some(found) = loose_pattern(project_key).and_then(|re| re.find(text)) {
        let mut replaced = String::with_capacity(text.len() + 2);
        replaced.push_str(&text[..found.start()]);
        replaced.push_str(bracketed);
        replaced.push_str(&text[found.end()..]);
        return replaced;
    }

    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        bracketed.to_string()
    } else {
        format!("{trimmed}\n\n{bracketed}")
    }
}

/// A validated ticket identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketRef {
    pub project_key: String,
    pub number: i64,
}

impl TicketRef {
    pub fn new<T: Display>(project_key: &str, ticket: T) -> Result<Self, GluError> {
        let raw = ticket.to_string();
        let number = raw
            .trim()
            .parse()
            .map_err(|_| GluError::InvalidTicketNumber(raw.clone()))?;
        Ok(Self {
            project_key: project_key.to_string(),
            number,
        })
    }

    /// Parses a full `KEY-N` identifier as returned by Jira
    pub fn parse_key(key: &str) -> Result<Self, GluError> {
        let (project, number) = key
            .trim()
            .rsplit_once('-')
            .ok_or_else(|| GluError::InvalidTicketNumber(key.to_string()))?;
        Self::new(project, number)
    }

    /// `[KEY-N]`
    pub fn bracketed(&self) -> String {
        format!("[{self}]")
    }

    /// Infallible [`inject_ticket_key`] for an already validated ticket
    pub fn inject(&self, text: &str) -> String {
        inject_bracketed(text, &self.project_key, &self.bracketed())
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project_key, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_ticket_accepts_strings_and_integers() {
        assert_eq!(format_ticket("ABC", "42", false).expect("valid"), "ABC-42");
        assert_eq!(format_ticket("ABC", 42, false).expect("valid"), "ABC-42");
        assert_eq!(format_ticket("ABC", " 007 ", true).expect("valid"), "[ABC-7]");
    }

    #[test]
    fn test_format_ticket_rejects_non_integers() {
        for bad in ["", "abc", "4.2", "ABC-42"] {
            let err = format_ticket("ABC", bad, false).expect_err("should reject");
            assert!(matches!(err, GluError::InvalidTicketNumber(ref raw) if raw == bad));
        }
    }

    #[test]
    fn test_find_ticket_key_in_free_text() {
        assert_eq!(find_ticket_key("fix ABC-12 crash", "ABC"), Some("ABC-12"));
        assert_eq!(find_ticket_key("[ABC-12] crash", "ABC"), Some("[ABC-12]"));
        assert_eq!(find_ticket_key("see ABC-1x2", "ABC"), Some("ABC-1x2"));
        assert_eq!(find_ticket_key("see XYZ-12", "ABC"), None);
        assert_eq!(find_ticket_key("ABC-12", ""), None);
    }

    #[test]
    fn test_find_ticket_number() {
        assert_eq!(
            find_ticket_number("merge [ABC-77] now", "ABC").as_deref(),
            Some("77")
        );
        assert_eq!(find_ticket_number("nothing here", "ABC"), None);
    }

    #[test]
    fn test_find_ticket_numbers_keeps_every_reference() {
        assert_eq!(
            find_ticket_numbers("after ABC-old, closes [ABC-42] and ABC-7", "ABC"),
            vec!["old", "42", "7"]
        );
        assert!(find_ticket_numbers("ABC-1", "").is_empty());
    }

    #[test]
    fn test_inject_leaves_canonical_form_untouched() {
        let body = "Closes [ABC-42]\n\nAlso ABC-42 mentioned";
        assert_eq!(inject_ticket_key(body, "ABC", "42").expect("ok"), body);
    }

    #[test]
    fn test_inject_replaces_loose_reference_in_place() {
        let body = "Fixes bug\n\nABC-42 causes crash";
        assert_eq!(
            inject_ticket_key(body, "ABC", "42").expect("ok"),
            "Fixes bug\n\n[ABC-42] causes crash"
        );
    }

    #[test]
    fn test_inject_replaces_only_first_loose_reference() {
        let body = "ABC-42 and ABC-42";
        assert_eq!(
            inject_ticket_key(body, "ABC", 42).expect("ok"),
            "[ABC-42] and ABC-42"
        );
    }

    #[test]
    fn test_inject_appends_when_absent() {
        assert_eq!(
            inject_ticket_key("Adds caching\n", "ABC", "7").expect("ok"),
            "Adds caching\n\n[ABC-7]"
        );
        assert_eq!(inject_ticket_key("", "ABC", "7").expect("ok"), "[ABC-7]");
    }

    #[test]
    fn test_inject_is_idempotent() {
        let inputs = [
            "",
            "plain body",
            "ABC-9 loose",
            "[ABC-9] done",
            "half [ABC-9 open",
        ];
        for input in inputs {
            let once = inject_ticket_key(input, "ABC", "9").expect("ok");
            let twice = inject_ticket_key(&once, "ABC", "9").expect("ok");
            assert_eq!(once, twice, "input: {input:?}");
        }
    }

    #[test]
    fn test_ticket_ref_display_and_parse() {
        let ticket = TicketRef::parse_key("ABC-0042").expect("valid");
        assert_eq!(ticket.to_string(), "ABC-42");
        assert_eq!(ticket.bracketed(), "[ABC-42]");
        assert!(TicketRef::parse_key("ABC").is_err());
        assert_eq!(
            ticket.inject("Fixes bug\n\nABC-42 causes crash"),
            "Fixes bug\n\n[ABC-42] causes crash"
        );
    }

    #[test]
    fn test_inject_rejects_bad_ticket() {
        assert!(inject_ticket_key("body", "ABC", "nope").is_err());
    }
}
