pub mod adf;
mod models;

pub use models::*;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::tracker::IssueTracker;

#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl JiraClient {
    pub fn new(base_url: &str, username: &str, api_token: &str) -> Self {
        let credentials = format!("{}:{}", username, api_token);
        let auth_header = format!("Basic {}", STANDARD.encode(credentials));

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/3/{}", self.base_url, path)
    }

    /// URL under `issue/{key}` with the key escaped as a single path segment.
    fn issue_url(&self, issue_key: &str, suffix: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Jira base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Jira base URL cannot have a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["rest", "api", "3", "issue", issue_key])
            .extend(suffix);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Jira API error ({}): {}", status, error_text);
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response
            .json::<T>()
            .await
            .context("Failed to parse Jira response")?;
        Ok(body)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn myself(&self) -> Result<User> {
        self.send_json(self.client.get(self.url("myself"))).await
    }

    async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        let url = self.issue_url(issue_key, &[])?;
        self.send_json(
            self.client
                .get(url)
                .query(&[("fields", "summary,status,assignee")]),
        )
        .await
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        self.send_json(self.client.post(self.url("issue")).json(&issue.to_fields()))
            .await
    }

    async fn update_issue(&self, issue_key: &str, update: &IssueUpdate) -> Result<()> {
        let url = self.issue_url(issue_key, &[])?;
        self.send(self.client.put(url).json(&update.to_body()))
            .await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        self.send_json(
            self.client
                .get(self.url("user/search"))
                .query(&[("query", query)]),
        )
        .await
    }

    async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let url = self.issue_url(issue_key, &["transitions"])?;
        let transitions: Transitions = self.send_json(self.client.get(url)).await?;
        Ok(transitions.transitions)
    }

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let url = self.issue_url(issue_key, &["transitions"])?;
        let body = json!({ "transition": { "id": transition_id } });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn assign_issue(&self, issue_key: &str, account_id: &str) -> Result<()> {
        let url = self.issue_url(issue_key, &["assignee"])?;
        let body = json!({ "accountId": account_id });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_AUTH: &str = "Basic dGVzdEBleGFtcGxlLmNvbTp0ZXN0LXRva2Vu";

    fn test_client(server: &MockServer) -> JiraClient {
        JiraClient::new(&server.uri(), "test@example.com", "test-token")
    }

    fn issue_json(key: &str, summary: &str, status: &str) -> serde_json::Value {
        json!({
            "id": "10001",
            "key": key,
            "self": format!("https://example.atlassian.net/rest/api/3/issue/{}", key),
            "fields": {
                "summary": summary,
                "status": { "name": status },
                "assignee": null
            }
        })
    }

    #[tokio::test]
    async fn myself_returns_authenticated_user() {
        // Given: a mock server that knows the caller
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .and(header("Authorization", TEST_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accountId": "acc-self",
                "displayName": "Test User",
                "emailAddress": "test@example.com"
            })))
            .mount(&mock_server)
            .await;

        // When: fetching the caller's identity
        let user = test_client(&mock_server).myself().await.unwrap();

        // Then: the account is returned
        assert_eq!(user.account_id, "acc-self");
        assert_eq!(user.display_name, "Test User");
    }

    #[tokio::test]
    async fn myself_returns_error_on_bad_credentials() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let result = test_client(&mock_server).myself().await;

        let error_message = result.unwrap_err().to_string();
        assert!(error_message.contains("401"));
        assert!(error_message.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn get_issue_returns_issue_details() {
        // Given: a mock server with a specific issue
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/SMS-12"))
            .and(header("Authorization", TEST_AUTH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(issue_json("SMS-12", "Fix login", "Open")),
            )
            .mount(&mock_server)
            .await;

        // When: getting the issue
        let issue = test_client(&mock_server).get_issue("SMS-12").await.unwrap();

        // Then: the issue details are returned
        assert_eq!(issue.key, "SMS-12");
        assert_eq!(issue.fields.summary.as_deref(), Some("Fix login"));
        assert_eq!(
            issue.fields.status.as_ref().map(|s| s.name.as_str()),
            Some("Open")
        );
        assert!(issue.fields.assignee.is_none());
    }

    #[tokio::test]
    async fn get_issue_returns_error_when_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/SMS-999"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Issue does not exist"))
            .mount(&mock_server)
            .await;

        let result = test_client(&mock_server).get_issue("SMS-999").await;

        assert!(result.unwrap_err().to_string().contains("404"));
    }

    #[tokio::test]
    async fn create_issue_posts_fields_and_returns_key() {
        // Given: a mock server accepting new issues
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .and(header("Authorization", TEST_AUTH))
            .and(body_partial_json(json!({
                "fields": {
                    "project": { "key": "SMS" },
                    "summary": "Bug",
                    "issuetype": { "name": "Bug" },
                    "priority": { "name": "High" },
                    "assignee": { "accountId": "acc-bob" }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10050",
                "key": "SMS-50",
                "self": "https://example.atlassian.net/rest/api/3/issue/10050"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let issue = NewIssue {
            project_key: "SMS".to_string(),
            summary: "Bug".to_string(),
            issue_type: "Bug".to_string(),
            priority: Some("High".to_string()),
            assignee_account_id: Some("acc-bob".to_string()),
            ..Default::default()
        };

        // When: creating the issue
        let created = test_client(&mock_server).create_issue(&issue).await.unwrap();

        // Then: the new key is returned
        assert_eq!(created.key, "SMS-50");
    }

    #[tokio::test]
    async fn create_issue_surfaces_validation_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": { "issuetype": "Specify a valid issue type" }
            })))
            .mount(&mock_server)
            .await;

        let issue = NewIssue {
            project_key: "SMS".to_string(),
            summary: "Bug".to_string(),
            issue_type: "Nope".to_string(),
            ..Default::default()
        };
        let result = test_client(&mock_server).create_issue(&issue).await;

        let error_message = result.unwrap_err().to_string();
        assert!(error_message.contains("400"));
        assert!(error_message.contains("Specify a valid issue type"));
    }

    #[tokio::test]
    async fn update_issue_puts_set_operations() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/3/issue/SMS-12"))
            .and(body_json(json!({
                "update": { "summary": [{ "set": "Renamed" }] }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = test_client(&mock_server)
            .update_issue("SMS-12", &IssueUpdate::new().summary("Renamed"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn search_users_passes_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/user/search"))
            .and(query_param("query", "alice@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "accountId": "acc-alice", "displayName": "Alice", "emailAddress": "alice@example.com" }
            ])))
            .mount(&mock_server)
            .await;

        let users = test_client(&mock_server)
            .search_users("alice@example.com")
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].account_id, "acc-alice");
    }

    #[tokio::test]
    async fn transitions_are_listed_and_executed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/SMS-12/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [
                    { "id": "21", "name": "Start", "to": { "name": "In Progress" } },
                    { "id": "31", "name": "Finish", "to": { "name": "Done" } }
                ]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue/SMS-12/transitions"))
            .and(body_json(json!({ "transition": { "id": "31" } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let transitions = client.get_transitions("SMS-12").await.unwrap();
        let result = client.transition_issue("SMS-12", "31").await;

        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[1].target_name(), "Done");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn assign_issue_puts_account_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/3/issue/SMS-12/assignee"))
            .and(body_json(json!({ "accountId": "acc-bob" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = test_client(&mock_server)
            .assign_issue("SMS-12", "acc-bob")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn issue_key_is_escaped_as_a_single_path_segment() {
        // Given: a server that only knows the escaped path
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/3/issue/SMS-1%2F..%2Fx%3Fy/assignee"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        // When: assigning an issue whose key contains path and query characters
        let result = test_client(&mock_server)
            .assign_issue("SMS-1/../x?y", "acc-bob")
            .await;

        // Then: the key stays inside the issue path
        assert!(result.is_ok());
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
    }

    #[test]
    fn issue_url_keeps_base_path_prefix() {
        let client = JiraClient::new("https://example.com/jira/", "test@example.com", "token");

        let url = client.issue_url("SMS-12", &["transitions"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.com/jira/rest/api/3/issue/SMS-12/transitions"
        );
    }

    #[test]
    fn client_trims_trailing_slash_from_base_url() {
        let client = JiraClient::new("https://example.atlassian.net/", "test@example.com", "token");

        assert_eq!(client.base_url, "https://example.atlassian.net");
    }

    #[test]
    fn client_generates_correct_auth_header() {
        let client = JiraClient::new(
            "https://example.atlassian.net",
            "user@example.com",
            "api-token",
        );

        // base64("user@example.com:api-token")
        assert_eq!(
            client.auth_header,
            "Basic dXNlckBleGFtcGxlLmNvbTphcGktdG9rZW4="
        );
    }
}
