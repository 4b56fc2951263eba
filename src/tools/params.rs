use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueParams {
    /// Short one-line title of the issue
    pub summary: String,
    /// Issue body (plain text or Markdown). A line containing 'assign to: <name or email>' picks the assignee.
    #[serde(default)]
    pub description: String,
    /// Issue type name (e.g., 'Bug', 'Task', 'Story'). Defaults to 'Task'.
    #[serde(default)]
    pub issue_type: String,
    /// Priority name (e.g., 'High', 'Medium', 'Low'). Omit to use the project default.
    #[serde(default)]
    pub priority: String,
    /// Project key (e.g., 'PROJ'). Defaults to the server's configured project.
    #[serde(default)]
    pub project_key: Option<String>,
    /// Labels to attach to the issue
    #[serde(default)]
    pub labels: Vec<String>,
    /// Component names to attach to the issue
    #[serde(default)]
    pub components: Vec<String>,
    /// Extra fields keyed by Jira field id (e.g., 'customfield_10010'), passed through unchanged
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    /// Explicit assignee. Ignored when the description contains an 'assign to:' line.
    #[serde(default)]
    pub assignee: Option<AssigneeRef>,
}

#[derive(Debug, Default, Clone, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeRef {
    /// Jira account id of the user
    #[serde(default)]
    pub account_id: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueParams {
    /// The issue key (e.g., 'PROJ-123')
    pub issue_key: String,
    /// New summary; omit to leave unchanged
    #[serde(default)]
    pub summary: String,
    /// New description; omit to leave unchanged
    #[serde(default)]
    pub description: String,
    /// Target workflow status (e.g., 'In Progress', 'Done'); applied through an available transition
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignIssueParams {
    /// The issue key (e.g., 'PROJ-123')
    pub issue_key: String,
    /// Email address, display name or username of the new assignee
    pub assignee: String,
}
