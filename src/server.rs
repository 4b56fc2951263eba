use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer,
    handler::server::router::tool::ToolRouter,
    handler::server::tool::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::tools::{
    AssignIssueParams, CreateIssueParams, IssueToolAdapter, ToolOutcome, UpdateIssueParams,
};

pub const SERVER_NAME: &str = "jira-issue-mcp";

#[derive(Clone)]
pub struct JiraServer {
    adapter: Arc<IssueToolAdapter>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl JiraServer {
    pub fn new(adapter: IssueToolAdapter) -> Self {
        Self {
            adapter: Arc::new(adapter),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "create-jira-issue",
        description = "Create a new Jira issue. Add a line 'assign to: <name or email>' to the description to pick the assignee; otherwise the explicit assignee or the authenticated user is assigned. Returns the issue URL."
    )]
    async fn create_jira_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("create-jira-issue: {}", params.summary);
        let outcome = until_cancelled(&context.ct, self.adapter.create_issue(params)).await?;
        Ok(outcome.into())
    }

    #[tool(
        name = "update-jira-issue",
        description = "Update the summary and/or description of an existing Jira issue, and optionally move it to a new workflow status. Fields left empty are not changed."
    )]
    async fn update_jira_issue(
        &self,
        Parameters(params): Parameters<UpdateIssueParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("update-jira-issue: {}", params.issue_key);
        let outcome = until_cancelled(&context.ct, self.adapter.update_issue(params)).await?;
        Ok(outcome.into())
    }

    #[tool(
        name = "assign-jira-issue",
        description = "Assign an existing Jira issue to a user found by email address, display name or username."
    )]
    async fn assign_jira_issue(
        &self,
        Parameters(params): Parameters<AssignIssueParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("assign-jira-issue: {} -> {}", params.issue_key, params.assignee);
        let outcome = until_cancelled(&context.ct, self.adapter.assign_issue(params)).await?;
        Ok(outcome.into())
    }
}

#[tool_handler]
impl rmcp::ServerHandler for JiraServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Jira MCP Server - Create, update, and assign Jira issues".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl From<ToolOutcome> for CallToolResult {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            ToolOutcome::Success(text) => CallToolResult::success(vec![Content::text(text)]),
            ToolOutcome::Failure(text) => CallToolResult::error(vec![Content::text(text)]),
        }
    }
}

/// Runs a tool body until it finishes or the caller cancels the request.
/// Cancelling drops the body, aborting any tracker request still in flight.
async fn until_cancelled<F>(ct: &CancellationToken, work: F) -> Result<ToolOutcome, McpError>
where
    F: Future<Output = ToolOutcome>,
{
    tokio::select! {
        biased;
        _ = ct.cancelled() => {
            warn!("Tool call cancelled by the client");
            Err(McpError::internal_error("request cancelled", None))
        }
        outcome = work => Ok(outcome),
    }
}
