use anyhow::Result;
use async_trait::async_trait;

use crate::jira::{CreatedIssue, Issue, IssueUpdate, NewIssue, Transition, User};

/// Operations the tools need from the issue tracker.
///
/// Implementations must be safe to call concurrently; every call is independent.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Identity of the authenticated caller.
    async fn myself(&self) -> Result<User>;

    async fn get_issue(&self, issue_key: &str) -> Result<Issue>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn update_issue(&self, issue_key: &str, update: &IssueUpdate) -> Result<()>;

    /// Users matching a free-text query (email, display name or username).
    async fn search_users(&self, query: &str) -> Result<Vec<User>>;

    async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>>;

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()>;

    async fn assign_issue(&self, issue_key: &str, account_id: &str) -> Result<()>;
}
