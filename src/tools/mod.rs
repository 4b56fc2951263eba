mod assignee;
mod formatters;
mod issues;
mod params;

pub use issues::{IssueToolAdapter, ToolOutcome};
pub use params::{AssignIssueParams, CreateIssueParams, UpdateIssueParams};
