use crate::jira::User;

/// Browsable link to an issue in the Jira web UI.
pub fn issue_url(base_url: &str, issue_key: &str) -> String {
    format!("{}/browse/{}", base_url.trim_end_matches('/'), issue_key)
}

pub fn format_created(url: &str) -> String {
    format!("Created JIRA issue: {}", url)
}

pub fn format_updated(url: &str, fields: &[&str], status: Option<&str>) -> String {
    let mut changes: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    if let Some(status) = status {
        changes.push(format!("status -> {}", status));
    }

    if changes.is_empty() {
        format!("Updated JIRA issue: {} (no changes requested)", url)
    } else {
        format!("Updated JIRA issue: {} ({})", url, changes.join(", "))
    }
}

pub fn format_assigned(url: &str, user: &User) -> String {
    let who = match user.email_address.as_deref() {
        Some(email) if !email.is_empty() => format!("{} <{}>", user.display_name, email),
        _ => user.display_name.clone(),
    };
    format!("Assigned JIRA issue: {} to {}", url, who)
}
