use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::jira::{Issue, IssueUpdate, NewIssue, Transition, User};
use crate::tools::assignee::{extract_assignee_directive, select_user};
use crate::tools::formatters::{format_assigned, format_created, format_updated, issue_url};
use crate::tools::params::{AssigneeRef, AssignIssueParams, CreateIssueParams, UpdateIssueParams};
use crate::tracker::IssueTracker;

const DEFAULT_ISSUE_TYPE: &str = "Task";

/// Outcome of a tool call. Tracker failures are reported here as text rather
/// than as protocol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

impl ToolOutcome {
    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::Failure(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }
}

/// Translates tool calls into issue tracker operations.
#[derive(Clone)]
pub struct IssueToolAdapter {
    tracker: Arc<dyn IssueTracker>,
    base_url: String,
    default_project: String,
}

impl IssueToolAdapter {
    pub fn new(tracker: Arc<dyn IssueTracker>, base_url: &str, default_project: &str) -> Self {
        Self {
            tracker,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_project: default_project.to_string(),
        }
    }

    pub async fn create_issue(&self, params: CreateIssueParams) -> ToolOutcome {
        let summary = params.summary.trim();
        if summary.is_empty() {
            return ToolOutcome::Failure(
                "Failed to create JIRA issue: summary is required".to_string(),
            );
        }

        let project_key = params
            .project_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.default_project)
            .to_string();

        let assignee = self
            .resolve_assignee(&params.description, params.assignee.as_ref())
            .await;

        let issue = NewIssue {
            project_key,
            summary: summary.to_string(),
            description: non_empty(&params.description),
            issue_type: non_empty(&params.issue_type)
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
            priority: non_empty(&params.priority),
            labels: params.labels,
            components: params.components,
            custom_fields: params.custom_fields,
            assignee_account_id: assignee,
        };

        match self.tracker.create_issue(&issue).await {
            Ok(created) => {
                let url = issue_url(&self.base_url, &created.key);
                info!("Created JIRA issue: {}", url);
                ToolOutcome::Success(format_created(&url))
            }
            Err(e) => {
                warn!("Failed to create JIRA issue in {}: {:#}", issue.project_key, e);
                ToolOutcome::Failure(format!("Failed to create JIRA issue: {:#}", e))
            }
        }
    }

    pub async fn update_issue(&self, params: UpdateIssueParams) -> ToolOutcome {
        let issue_key = params.issue_key.trim();
        if issue_key.is_empty() {
            return ToolOutcome::Failure(
                "Failed to update JIRA issue: issueKey is required".to_string(),
            );
        }

        let issue = match self.tracker.get_issue(issue_key).await {
            Ok(issue) => issue,
            Err(e) => {
                return ToolOutcome::Failure(format!(
                    "Failed to get JIRA issue {}: {:#}",
                    issue_key, e
                ));
            }
        };

        // Resolve the transition first so an unreachable status leaves the issue untouched.
        let transition = match non_empty(&params.status) {
            Some(status) => match self.find_transition(&issue, &status).await {
                Ok(transition) => transition,
                Err(message) => return ToolOutcome::Failure(message),
            },
            None => None,
        };

        let mut update = IssueUpdate::new();
        if let Some(summary) = non_empty(&params.summary) {
            update = update.summary(&summary);
        }
        if let Some(description) = non_empty(&params.description) {
            update = update.description(&description);
        }

        if !update.is_empty() {
            if let Err(e) = self.tracker.update_issue(&issue.key, &update).await {
                return ToolOutcome::Failure(format!(
                    "Failed to update JIRA issue {}: {:#}",
                    issue_key, e
                ));
            }
        }

        if let Some(transition) = &transition {
            if let Err(e) = self
                .tracker
                .transition_issue(&issue.key, &transition.id)
                .await
            {
                return ToolOutcome::Failure(format!(
                    "Failed to move JIRA issue {} to status '{}': {:#}",
                    issue_key,
                    transition.target_name(),
                    e
                ));
            }
        }

        let url = issue_url(&self.base_url, &issue.key);
        info!("Updated JIRA issue: {}", url);
        ToolOutcome::Success(format_updated(
            &url,
            &update.field_names(),
            transition.as_ref().map(|t| t.target_name()),
        ))
    }

    pub async fn assign_issue(&self, params: AssignIssueParams) -> ToolOutcome {
        let issue_key = params.issue_key.trim();
        let query = params.assignee.trim();
        if issue_key.is_empty() || query.is_empty() {
            return ToolOutcome::Failure(
                "Failed to assign JIRA issue: issueKey and assignee are required".to_string(),
            );
        }

        let issue = match self.tracker.get_issue(issue_key).await {
            Ok(issue) => issue,
            Err(e) => {
                return ToolOutcome::Failure(format!(
                    "Failed to get JIRA issue {}: {:#}",
                    issue_key, e
                ));
            }
        };

        let user = match self.find_user(query).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return ToolOutcome::Failure(format!("No JIRA user found for '{}'", query));
            }
            Err(e) => return ToolOutcome::Failure(format!("{:#}", e)),
        };

        if let Err(e) = self.tracker.assign_issue(&issue.key, &user.account_id).await {
            return ToolOutcome::Failure(format!(
                "Failed to assign JIRA issue {}: {:#}",
                issue_key, e
            ));
        }

        let url = issue_url(&self.base_url, &issue.key);
        info!("Assigned JIRA issue {} to {}", url, user.display_name);
        ToolOutcome::Success(format_assigned(&url, &user))
    }

    /// Account id for a new issue: the description's `assign to:` directive
    /// first, then the explicit assignee, then the caller. Lookup failures
    /// leave the issue unassigned.
    pub async fn resolve_assignee(
        &self,
        description: &str,
        explicit: Option<&AssigneeRef>,
    ) -> Option<String> {
        if let Some(query) = extract_assignee_directive(description) {
            info!("Attempting to find and assign user: {}", query);
            return match self.find_user(&query).await {
                Ok(Some(user)) => {
                    info!(
                        "Found user {} ({}) to assign",
                        user.display_name,
                        user.email_address.as_deref().unwrap_or("no email")
                    );
                    Some(user.account_id)
                }
                Ok(None) => {
                    warn!("Could not assign user: no user found for '{}'", query);
                    None
                }
                Err(e) => {
                    warn!("Could not assign user: {:#}", e);
                    None
                }
            };
        }

        if let Some(account_id) = explicit
            .map(|a| a.account_id.trim())
            .filter(|id| !id.is_empty())
        {
            info!("Assigning user from 'assignee' parameter: {}", account_id);
            return Some(account_id.to_string());
        }

        match self.tracker.myself().await {
            Ok(user) => {
                info!("Defaulting assignee to current user: {}", user.display_name);
                Some(user.account_id)
            }
            Err(e) => {
                warn!("Could not get current user to self-assign: {:#}", e);
                None
            }
        }
    }

    /// Looks a user up by email, display name or username. An empty query or
    /// an empty search result yields `None`.
    pub async fn find_user(&self, query: &str) -> anyhow::Result<Option<User>> {
        if query.is_empty() {
            return Ok(None);
        }

        let candidates = self
            .tracker
            .search_users(query)
            .await
            .map_err(|e| e.context(format!("error searching for user '{}'", query)))?;
        debug!("User search for '{}' returned {} candidates", query, candidates.len());

        Ok(select_user(candidates, query))
    }

    async fn find_transition(
        &self,
        issue: &Issue,
        status: &str,
    ) -> Result<Option<Transition>, String> {
        let current = issue.fields.status.as_ref().map(|s| s.name.as_str());
        if current.is_some_and(|c| c.eq_ignore_ascii_case(status)) {
            debug!("JIRA issue {} is already in status '{}'", issue.key, status);
            return Ok(None);
        }

        let transitions = self
            .tracker
            .get_transitions(&issue.key)
            .await
            .map_err(|e| format!("Failed to get transitions for JIRA issue {}: {:#}", issue.key, e))?;

        let wanted = status.to_lowercase();
        let by_target = transitions
            .iter()
            .position(|t| t.target_name().to_lowercase() == wanted);
        let by_name = || transitions.iter().position(|t| t.name.to_lowercase() == wanted);

        match by_target.or_else(by_name) {
            Some(index) => Ok(transitions.into_iter().nth(index)),
            None => {
                let available: Vec<&str> = transitions.iter().map(|t| t.target_name()).collect();
                let available = if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                };
                Err(format!(
                    "Cannot move JIRA issue {} to status '{}': available statuses are {}",
                    issue.key, status, available
                ))
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
