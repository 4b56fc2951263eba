use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    pub self_url: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub status: Option<Status>,
    pub assignee: Option<User>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Status {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    pub email_address: Option<String>,
    /// Username on Server/Data Center deployments; absent on Cloud.
    pub name: Option<String>,
}

/// Response from POST /rest/api/3/issue
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    pub self_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: Option<Status>,
}

impl Transition {
    pub fn target_name(&self) -> &str {
        self.to.as_ref().map(|s| s.name.as_str()).unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Transitions {
    pub transitions: Vec<Transition>,
}

/// Fields of a new issue, ready to submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    pub description: Option<String>,
    pub issue_type: String,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub custom_fields: Map<String, Value>,
    pub assignee_account_id: Option<String>,
}

impl NewIssue {
    /// Renders the `fields` object of the create request. Custom fields never
    /// override the core fields.
    pub fn to_fields(&self) -> Value {
        let mut fields = self.custom_fields.clone();

        fields.insert("project".to_string(), json!({ "key": self.project_key }));
        fields.insert("summary".to_string(), json!(self.summary));
        fields.insert("issuetype".to_string(), json!({ "name": self.issue_type }));
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), super::adf::to_adf(description));
        }
        if let Some(priority) = &self.priority {
            fields.insert("priority".to_string(), json!({ "name": priority }));
        }
        if !self.labels.is_empty() {
            fields.insert("labels".to_string(), json!(self.labels));
        }
        if !self.components.is_empty() {
            let components: Vec<Value> = self
                .components
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            fields.insert("components".to_string(), Value::Array(components));
        }
        if let Some(account_id) = &self.assignee_account_id {
            fields.insert("assignee".to_string(), json!({ "accountId": account_id }));
        }

        json!({ "fields": fields })
    }
}

/// Partial update of an existing issue, expressed as `set` operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl IssueUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.description.is_none()
    }

    /// Names of the fields this update touches.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.summary.is_some() {
            names.push("summary");
        }
        if self.description.is_some() {
            names.push("description");
        }
        names
    }

    pub fn to_body(&self) -> Value {
        let mut update = Map::new();
        if let Some(summary) = &self.summary {
            update.insert("summary".to_string(), json!([{ "set": summary }]));
        }
        if let Some(description) = &self.description {
            update.insert(
                "description".to_string(),
                json!([{ "set": super::adf::to_adf(description) }]),
            );
        }
        json!({ "update": update })
    }
}
