use glu::commands::pr_create::{PrCreateOptions, create_pr, transition_ticket};
use glu::context::Services;
use glu::providers::Provider;
use glu::ticket_key::TicketRef;
use pretty_assertions::assert_eq;
use std::fs;

mod test_utils;
use test_utils::{
    Answer, FakeCodeHost, FakeIssueTracker, ScriptedChat, ScriptedPrompter, checkout_new_branch,
    commit_file, git, setup_git_repo_with_remote, test_config, transition,
};

const REPO: &str = "acme/widgets";
const TICKET_PROMPT: &str = "Ticket [enter #, enter (c) to create, or Enter to skip]";

#[tokio::test]
async fn test_create_pr_with_ticket_and_exact_reviewer() {
    let (work_dir, remote_dir, repo) = setup_git_repo_with_remote();
    let path = work_dir.path();
    checkout_new_branch(path, "feature/cache");
    let head = commit_file(path, "cache.rs", "fn cache() {}", "Add cache\n\nCaches ABC-42 lookups");

    let config = test_config();
    let host = FakeCodeHost::default();
    let tracker = FakeIssueTracker::default();
    let prompter = ScriptedPrompter::new(vec![]);
    let services = Services::new(&config, &host, &tracker, &prompter);

    let options = PrCreateOptions {
        ticket: Some("42".to_string()),
        ready_for_review: true,
        reviewers: vec!["alice".to_string()],
        ..PrCreateOptions::default()
    };
    let outcome = create_pr(&services, &repo, REPO, None, &options)
        .await
        .expect("PR created");

    // The unpushed branch was pushed during sync
    assert_eq!(git(remote_dir.path(), &["rev-parse", "feature/cache"]), head);

    assert_eq!(outcome.pr.title, "Add cache");
    assert_eq!(outcome.pr.body_text(), "Caches [ABC-42] lookups");
    assert_eq!(outcome.ticket, Some(TicketRef::new("ABC", 42).expect("ticket")));
    assert_eq!(outcome.reviewers, vec!["alice"]);
    assert_eq!(outcome.transitions, vec!["Starting", "Ready for review"]);
    assert_eq!(
        tracker.applied(),
        vec!["ABC-42 Starting", "ABC-42 Ready for review"]
    );

    let calls = host.calls();
    assert!(calls.contains(&"create_pull_request feature/cache->main".to_string()));
    assert!(calls.contains(&"add_assignees 1 octocat".to_string()));
    assert!(calls.contains(&"request_reviewer 1 alice".to_string()));
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_draft_pr_never_moves_ticket_to_ready_for_review() {
    let (work_dir, _remote_dir, repo) = setup_git_repo_with_remote();
    let path = work_dir.path();
    checkout_new_branch(path, "feature/draft");
    commit_file(path, "a.rs", "a", "Start draft work");
    git(path, &["push", "--quiet", "origin", "feature/draft"]);
    commit_file(path, "b.rs", "b", "More draft work");

    let config = test_config();
    let host = FakeCodeHost::default();
    let tracker = FakeIssueTracker::offering_everything();
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);
    let services = Services::new(&config, &host, &tracker, &prompter);

    let options = PrCreateOptions {
        ticket: Some("7".to_string()),
        draft: true,
        ready_for_review: true,
        ..PrCreateOptions::default()
    };
    let outcome = create_pr(&services, &repo, REPO, None, &options)
        .await
        .expect("draft PR created");

    assert!(outcome.pr.draft);
    assert_eq!(outcome.pr.title, "Start draft work");
    assert_eq!(tracker.applied(), vec!["ABC-7 Starting"]);
    assert!(outcome.reviewers.is_empty());
    assert!(!host.calls().iter().any(|c| c.starts_with("org_members")));
    assert_eq!(
        prompter.asked(),
        vec!["Local branch is not up to date with remote. Push to remote now?"]
    );
}

#[tokio::test]
async fn test_manual_commit_then_skip_ticket() {
    let (work_dir, _remote_dir, repo) = setup_git_repo_with_remote();
    let path = work_dir.path();
    checkout_new_branch(path, "feature/docs");
    fs::write(path.join("README.md"), "# Widgets").expect("write");

    let config = test_config();
    let host = FakeCodeHost {
        rejected_reviewers: vec!["carol".to_string()],
        members: vec![
            test_utils::user("bob"),
            test_utils::user("carol"),
            test_utils::user("dave"),
        ],
        ..FakeCodeHost::default()
    };
    let tracker = FakeIssueTracker::default();
    let prompter = ScriptedPrompter::new(vec![
        // Without a chat model the first choice is the manual commit
        Answer::Select(0),
        Answer::Editor("Add docs\n\nWrite the README".to_string()),
        Answer::Text(String::new()),
    ]);
    let services = Services::new(&config, &host, &tracker, &prompter);

    let options = PrCreateOptions {
        reviewers: vec!["bob".to_string(), "carol".to_string()],
        ready_for_review: true,
        ..PrCreateOptions::default()
    };
    let outcome = create_pr(&services, &repo, REPO, None, &options)
        .await
        .expect("PR created despite a failed reviewer");

    assert!(!repo.is_dirty().expect("status"));
    assert_eq!(outcome.pr.title, "Add docs");
    assert_eq!(outcome.pr.body_text(), "Write the README");
    assert_eq!(outcome.reviewers, vec!["bob"]);
    assert!(host.calls().contains(&"request_reviewer 1 carol".to_string()));
    assert_eq!(outcome.ticket, None);
    assert!(tracker.applied().is_empty());
    assert_eq!(
        prompter.asked(),
        vec!["You have uncommitted changes.", "Commit message", TICKET_PROMPT]
    );
}

#[tokio::test]
async fn test_generated_description_and_ticket_created_afterwards() {
    let (work_dir, _remote_dir, repo) = setup_git_repo_with_remote();
    let path = work_dir.path();
    checkout_new_branch(path, "feature/cache");
    commit_file(path, "cache.rs", "fn cache() {}", "Add cache");

    let config = test_config();
    let host = FakeCodeHost::default();
    let tracker = FakeIssueTracker::default();
    let chat = ScriptedChat::new(
        Provider::OpenAI,
        &[
            r###"{"description": "## Summary\nAdds a cache"}"###,
            r#"{"summary": "Cache lookups", "description": "Add a cache", "issuetype": "Task"}"#,
        ],
    );
    let prompter = ScriptedPrompter::new(vec![
        Answer::MultiSelect(vec![0]),
        Answer::Text("c".to_string()),
    ]);
    let services = Services::new(&config, &host, &tracker, &prompter);

    let options = PrCreateOptions {
        ready_for_review: true,
        ..PrCreateOptions::default()
    };
    let outcome = create_pr(&services, &repo, REPO, Some(&chat), &options)
        .await
        .expect("PR created");

    assert_eq!(outcome.reviewers, vec!["alice"]);
    assert_eq!(outcome.ticket, Some(TicketRef::new("ABC", 101).expect("ticket")));
    assert_eq!(outcome.pr.body_text(), "## Summary\nAdds a cache\n\n[ABC-101]");
    assert!(host.calls().contains(&"pull_request_diff 1".to_string()));

    let created = tracker.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].issue_type, "Task");
    assert_eq!(created[0].summary, "Cache lookups");
    assert_eq!(created[0].reporter.as_deref(), Some("acc-me"));
    assert_eq!(created[0].assignee.as_deref(), Some("acc-me"));
    assert_eq!(outcome.transitions, vec!["Starting", "Ready for review"]);

    let prompts = chat.prompts();
    assert!(prompts[1].contains("Add cache"));
    assert!(prompts[1].contains("Related pull request:\n## Summary\nAdds a cache"));
}

#[tokio::test]
async fn test_transition_skips_ready_for_review_when_not_requested() {
    let config = test_config();
    let tracker = FakeIssueTracker::offering_everything();
    let ticket = TicketRef::new("ABC", 5).expect("ticket");

    let applied = transition_ticket(&tracker, &config, &ticket, false)
        .await
        .expect("transitions");

    assert_eq!(applied, vec!["Starting"]);
    assert_eq!(tracker.applied(), vec!["ABC-5 Starting"]);
}

#[tokio::test]
async fn test_transition_applies_ready_for_review_without_in_progress() {
    let config = test_config();
    let tracker = FakeIssueTracker {
        workflow: vec![(
            "To Do".to_string(),
            vec![transition("31", "ready FOR review")],
        )],
        ..FakeIssueTracker::default()
    };
    let ticket = TicketRef::new("ABC", 6).expect("ticket");

    let applied = transition_ticket(&tracker, &config, &ticket, true)
        .await
        .expect("transitions");

    assert_eq!(applied, vec!["ready FOR review"]);
}

#[tokio::test]
async fn test_transitions_not_offered_are_skipped() {
    let config = test_config();
    let tracker = FakeIssueTracker {
        workflow: vec![("To Do".to_string(), vec![transition("41", "Won't do")])],
        ..FakeIssueTracker::default()
    };
    let ticket = TicketRef::new("ABC", 8).expect("ticket");

    let applied = transition_ticket(&tracker, &config, &ticket, true)
        .await
        .expect("missing transitions are not errors");

    assert!(applied.is_empty());
    assert!(tracker.applied().is_empty());
}
