/// Diffs beyond this many bytes are cut before being sent
pub const MAX_DIFF_BYTES: usize = 60_000;

/// What went wrong with the previous attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub previous_output: String,
    pub error: String,
}

pub fn feedback_section(feedback: Option<&Feedback>) -> String {
    match feedback {
        Some(feedback) => format!(
            "Your previous response was rejected.\n\
            Error on previous attempt: {}\n\
            Previous response:\n{}\n\n",
            feedback.error, feedback.previous_output
        ),
        None => String::new(),
    }
}

/// Cuts `diff` at a char boundary below [`MAX_DIFF_BYTES`]
pub fn truncate_diff(diff: &str) -> String {
    if diff.len() <= MAX_DIFF_BYTES {
        return diff.to_string();
    }
    let mut end = MAX_DIFF_BYTES;
    while !diff.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[diff truncated]", &diff[..end])
}

pub fn commit_prompt(
    diff: &str,
    branch: &str,
    revision: Option<(&str, &str)>,
    feedback: Option<&Feedback>,
) -> String {
    let mut prompt = feedback_section(feedback);

    if let Some((previous, changes)) = revision {
        prompt.push_str(&format!(
            "Requested changes from previous generation: {changes}\n\nPrevious generation:\n{previous}\n\n"
        ));
    }

    prompt.push_str(&format!(
        "Write a git commit message for the changes below, made on branch '{branch}'.\n\n\
        Follow the conventional commit shape: a lowercase type (feat, fix, chore, docs, \
        refactor, test, perf, build, ci, style), a concise imperative title of at most \
        72 characters that does not repeat the type and contains no ':' characters, and a body \
        that explains what changed and why.\n\n\
        Respond with a JSON object and nothing else, in the format: \
        {{\"title\": \"{{title}}\", \"body\": \"{{body}}\", \"type\": \"{{type}}\"}}\n\n\
        Diff:\n{}",
        truncate_diff(diff)
    ));
    prompt
}

pub fn squash_prompt(
    pr_title: &str,
    pr_body: &str,
    commit_messages: &[String],
    feedback: Option<&Feedback>,
) -> String {
    let mut prompt = feedback_section(feedback);

    let commits = commit_messages
        .iter()
        .map(|m| format!("- {}", m.trim().replace('\n', "\n  ")))
        .collect::<Vec<_>>()
        .join("\n");

    prompt.push_str(&format!(
        "Write a single squash commit message for a pull request titled '{pr_title}'.\n\n\
        Combine the intent of all of its commits. Use the conventional commit shape: a lowercase \
        type, a concise imperative title with no ':' characters that does not repeat the type, and a body \
        summarizing the changes.\n\n\
        Respond with a JSON object and nothing else, in the format: \
        {{\"title\": \"{{title}}\", \"body\": \"{{body}}\", \"type\": \"{{type}}\"}}\n\n\
        PR body:\n{pr_body}\n\n\
        Commit messages:\n{commits}"
    ));
    prompt
}

pub struct PrPromptInput<'a> {
    /// "diff below" or the PR's URL
    pub location: &'a str,
    pub template: &'a str,
    pub body: &'a str,
    pub diff: Option<&'a str>,
    pub generate_title: bool,
}

pub fn pr_description_prompt(input: &PrPromptInput<'_>, feedback: Option<&Feedback>) -> String {
    let mut prompt = feedback_section(feedback);

    prompt.push_str(&format!(
        "Provide a description for the PR {}.\n\n\
        Be concise and informative about the contents of the PR, relevant to someone \
        reviewing the PR. Write the description in the following format:\n{}\n\n\
        PR body:\n{}\n\n",
        input.location, input.template, input.body
    ));

    if let Some(diff) = input.diff {
        prompt.push_str(&format!("PR diff:\n{}\n\n", truncate_diff(diff)));
    }

    if input.generate_title {
        prompt.push_str(
            "Also provide a concise PR title in the imperative mood.\n\
            Respond with a JSON object and nothing else, in the format: \
            {\"description\": \"{description}\", \"title\": \"{title}\"}",
        );
    } else {
        prompt.push_str(
            "Respond with a JSON object and nothing else, in the format: \
            {\"description\": \"{description}\"}",
        );
    }
    prompt
}

pub struct TicketPromptInput<'a> {
    pub user_prompt: &'a str,
    /// Issue type chosen up front; the model picks one when absent
    pub issue_type: Option<&'a str>,
    pub issue_types: &'a [String],
    pub templates: &'a [(String, String)],
    pub repo_context: Option<&'a str>,
    pub extra_context: Option<&'a str>,
    /// Previous draft as JSON and the requested changes
    pub revision: Option<(&'a str, &'a str)>,
}

pub fn ticket_prompt(input: &TicketPromptInput<'_>, feedback: Option<&Feedback>) -> String {
    let mut prompt = feedback_section(feedback);

    if let Some((previous, changes)) = input.revision {
        prompt.push_str(&format!(
            "Requested changes from previous generation: {changes}\n\n{previous}\n\n"
        ));
    }

    let kind = input.issue_type.unwrap_or("Jira");
    prompt.push_str(&format!(
        "Provide a description and summary for a {kind} ticket given the user prompt: {}\n\n\
        The summary should be as specific as possible to the goal of the ticket, \
        15 words or less.\n\n\
        Be concise in your descriptions, with the goal of providing a clear scope of the work \
        to be completed in this ticket.\n\n",
        input.user_prompt
    ));

    if input.issue_type.is_none() && !input.issue_types.is_empty() {
        prompt.push_str(&format!(
            "Pick the most fitting issue type from: {}.\n\n",
            input.issue_types.join(", ")
        ));
    }

    for (name, template) in input.templates {
        prompt.push_str(&format!(
            "The format of a {name} description is as follows, where the content in braces \
            needs to be replaced by content:\n{template}\n\n"
        ));
    }

    if let Some(context) = input.extra_context {
        prompt.push_str(&format!("Related pull request:\n{context}\n\n"));
    }

    if let Some(repo) = input.repo_context {
        prompt.push_str(&format!(
            "Tailor your response to the context of the {repo} Github repository.\n\n"
        ));
    }

    prompt.push_str(
        "Respond with a JSON object and nothing else, in the format: \
        {\"summary\": \"{ticket summary}\", \"description\": \"{ticket description}\", \
        \"issuetype\": \"{issue type}\"}",
    );
    prompt
}
