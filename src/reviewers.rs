//! Fuzzy matching of requested reviewer names against organization members.

use crate::github::User;
use crate::log_debug;
use crate::ui::Prompter;

use anyhow::Result;
use similar::TextDiff;

/// Number of candidates offered when a name is ambiguous
pub const MAX_SUGGESTIONS: usize = 5;

/// A candidate with its similarity to the requested name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedUser {
    pub user: User,
    /// 0..=100, where 100 means identical
    pub score: u8,
}

/// Similarity ratio in `[0, 100]`, case-insensitive. Only identical strings score 100.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 100;
    }

    let ratio = TextDiff::from_chars(a.as_str(), b.as_str()).ratio();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    let score = (ratio * 100.0).round().clamp(0.0, 99.0) as u8;
    score
}

/// Every candidate scored against `name`, best first. Ties keep the input order.
pub fn rank_candidates(name: &str, candidates: &[User]) -> Vec<MatchedUser> {
    let mut ranked: Vec<MatchedUser> = candidates
        .iter()
        .map(|user| MatchedUser {
            score: similarity(name, &user.login),
            user: user.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Resolves requested names to members.
///
/// An exact match is taken without asking; otherwise the best suggestions are
/// offered. With no names, every member is offered for multi-selection.
pub fn match_reviewers(
    requested: &[String],
    candidates: &[User],
    prompter: &dyn Prompter,
) -> Result<Vec<User>> {
    if requested.is_empty() {
        let logins: Vec<String> = candidates.iter().map(|u| u.login.clone()).collect();
        let chosen = prompter.multi_select("Select reviewers:", &logins)?;
        return Ok(chosen
            .into_iter()
            .filter_map(|index| candidates.get(index).cloned())
            .collect());
    }

    let mut selected: Vec<User> = Vec::new();
    for name in requested {
        let ranked = rank_candidates(name, candidates);
        let Some(best) = ranked.first() else {
            break;
        };

        let user = if best.score == 100 {
            log_debug!("Reviewer '{}' matched {} exactly", name, best.user.login);
            best.user.clone()
        } else {
            let top: Vec<&MatchedUser> = ranked.iter().take(MAX_SUGGESTIONS).collect();
            let labels: Vec<String> = top.iter().map(|m| m.user.login.clone()).collect();
            let index = prompter.select(&format!("Select reviewer for '{name}':"), &labels)?;
            match top.get(index) {
                Some(matched) => matched.user.clone(),
                None => continue,
            }
        };

        if !selected.iter().any(|u| u.login == user.login) {
            selected.push(user);
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str) -> User {
        User {
            login: login.to_string(),
            name: None,
        }
    }

    #[test]
    fn test_identical_names_score_100() {
        assert_eq!(similarity("jdoe", "jdoe"), 100);
        assert_eq!(similarity("JDoe", "jdoe"), 100);
        assert!(similarity("jdoe", "jdoe1") < 100);
        assert_eq!(similarity("abc", "xyz"), 0);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let candidates = vec![user("ab"), user("zz"), user("ba")];
        let ranked = rank_candidates("aa", &candidates);
        let logins: Vec<&str> = ranked.iter().map(|m| m.user.login.as_str()).collect();
        // "ab" and "ba" tie; input order is preserved
        assert_eq!(logins, vec!["ab", "ba", "zz"]);
    }
}
