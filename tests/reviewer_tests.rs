use glu::error::{GluError, as_glu_error};
use glu::reviewers::{match_reviewers, rank_candidates};

mod test_utils;
use test_utils::{Answer, ScriptedPrompter, user};

fn members() -> Vec<glu::github::User> {
    ["alice", "albert", "alicia", "bob", "carol", "dave", "alison"]
        .into_iter()
        .map(user)
        .collect()
}

fn names(requested: &[&str]) -> Vec<String> {
    requested.iter().map(|n| (*n).to_string()).collect()
}

#[test]
fn test_exact_match_is_selected_without_prompting() {
    let prompter = ScriptedPrompter::new(vec![]);

    let selected = match_reviewers(&names(&["Alice"]), &members(), &prompter).expect("match");

    assert_eq!(selected, vec![user("alice")]);
    assert!(prompter.asked().is_empty());
}

#[test]
fn test_ambiguous_name_offers_top_suggestions() {
    let prompter = ScriptedPrompter::new(vec![Answer::Select(0)]);

    let selected = match_reviewers(&names(&["alic"]), &members(), &prompter).expect("match");

    assert_eq!(prompter.asked(), vec!["Select reviewer for 'alic':"]);
    let ranked = rank_candidates("alic", &members());
    assert_eq!(selected, vec![ranked[0].user.clone()]);
    assert!(ranked[0].score < 100);
}

#[test]
fn test_ranking_is_descending() {
    let ranked = rank_candidates("zed", &members());
    assert_eq!(ranked.len(), members().len());
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_no_names_offers_every_member() {
    let prompter = ScriptedPrompter::new(vec![Answer::MultiSelect(vec![1, 3])]);

    let selected = match_reviewers(&[], &members(), &prompter).expect("match");

    assert_eq!(selected, vec![user("albert"), user("bob")]);
    assert_eq!(prompter.asked(), vec!["Select reviewers:"]);
}

#[test]
fn test_duplicate_requests_are_collapsed() {
    let prompter = ScriptedPrompter::new(vec![]);

    let selected =
        match_reviewers(&names(&["bob", "BOB", "carol"]), &members(), &prompter).expect("match");

    assert_eq!(selected, vec![user("bob"), user("carol")]);
}

#[test]
fn test_cancelled_prompt_propagates() {
    let prompter = ScriptedPrompter::new(vec![Answer::Cancel]);

    let err = match_reviewers(&names(&["al"]), &members(), &prompter).expect_err("cancelled");
    assert!(matches!(as_glu_error(&err), Some(GluError::Cancelled)));
}
