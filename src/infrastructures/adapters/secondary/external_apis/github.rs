use crate::domain::external_apis::github::{GitHubApi, QueryEnvelope, QueryVariables};
use anyhow::Error;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// The one GraphQL document this dashboard ever sends. `last: 5` keeps the
/// payload to the five most recent issues; ordering is whatever the API
/// returns for that slice.
const ISSUES_QUERY: &str = r#"
query ($organization: String!, $repository: String!) {
  organization(login: $organization) {
    name
    url
    repository(name: $repository) {
      name
      url
      issues(last: 5) {
        edges {
          node {
            id
            title
            url
          }
        }
      }
    }
  }
}
"#;

#[derive(Serialize, Debug)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a QueryVariables,
}

#[derive(Debug, thiserror::Error)]
pub enum GitHubApiError {
    #[error("GraphQL request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("GraphQL endpoint {url} returned an error status: {source}")]
    Status { url: String, source: reqwest::Error },
    #[error("Failed to decode GraphQL response from {url}: {source}")]
    Decode { url: String, source: reqwest::Error },
}

pub struct GitHubGraphqlAdapter {
    client: Client,
    endpoint: String,
    github_token: String,
}

impl GitHubGraphqlAdapter {
    pub fn new(endpoint: String, github_token: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            github_token,
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubGraphqlAdapter {
    /// One POST per call, no retry: a failed fetch is surfaced once and the
    /// user resubmits manually.
    #[tracing::instrument(name = "GitHubGraphqlAdapter::fetch_repository_issues", skip(self))]
    async fn fetch_repository_issues(
        &self,
        variables: &QueryVariables,
    ) -> Result<QueryEnvelope, Error> {
        let body = GraphqlRequest {
            query: ISSUES_QUERY,
            variables,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("bearer {}", self.github_token))
            .header("Accept", "application/json")
            .header("User-Agent", "issues-dashboard-rust-app")
            .json(&body)
            .send()
            .await
            .map_err(|source| GitHubApiError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        // GraphQL-level errors come back with a 200 and an `errors` array;
        // only HTTP-level failures (bad token, proxy trouble) land here.
        let response = response
            .error_for_status()
            .map_err(|source| GitHubApiError::Status {
                url: self.endpoint.clone(),
                source,
            })?;

        let envelope =
            response
                .json::<QueryEnvelope>()
                .await
                .map_err(|source| GitHubApiError::Decode {
                    url: self.endpoint.clone(),
                    source,
                })?;

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_document_requests_the_last_five_issues() {
        assert!(ISSUES_QUERY.contains("organization(login: $organization)"));
        assert!(ISSUES_QUERY.contains("repository(name: $repository)"));
        assert!(ISSUES_QUERY.contains("issues(last: 5)"));
        for field in ["id", "title", "url"] {
            assert!(ISSUES_QUERY.contains(field));
        }
    }

    #[test]
    fn request_body_pairs_the_document_with_the_variables() {
        let variables = QueryVariables::from_path("facebook/react");
        let body = GraphqlRequest {
            query: ISSUES_QUERY,
            variables: &variables,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["query"], json!(ISSUES_QUERY));
        assert_eq!(
            value["variables"],
            json!({ "organization": "facebook", "repository": "react" })
        );
    }

    #[test]
    fn request_body_carries_null_for_a_missing_repository() {
        let variables = QueryVariables::from_path("just-an-org");
        let body = GraphqlRequest {
            query: ISSUES_QUERY,
            variables: &variables,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["variables"]["repository"], json!(null));
    }
}
