//! Free-text assignee handling: the `assign to:` directive in issue
//! descriptions and picking the best match among user search results.

use crate::jira::User;

const DIRECTIVE: &str = "assign to:";

/// Returns the text following the first `assign to:` marker (any letter case)
/// up to the end of that line, trimmed. `None` when the marker is absent; an
/// empty string when the marker is present but names nobody.
pub fn extract_assignee_directive(description: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid for slicing the description.
    let start = description.to_ascii_lowercase().find(DIRECTIVE)? + DIRECTIVE.len();
    let rest = &description[start..];
    let line = rest.split('\n').next().unwrap_or_default();
    Some(line.trim().to_string())
}

/// Picks the candidate whose email, display name or username equals the query
/// ignoring case, otherwise the first candidate.
pub fn select_user(candidates: Vec<User>, query: &str) -> Option<User> {
    let query = query.to_lowercase();
    let matches = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase() == query);

    let exact = candidates.iter().position(|u| {
        matches(u.email_address.as_deref())
            || matches(Some(u.display_name.as_str()))
            || matches(u.name.as_deref())
    });

    let mut candidates = candidates;
    match exact {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}
