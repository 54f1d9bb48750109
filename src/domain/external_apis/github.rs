use crate::domain::models::issue::{GraphqlError, Organization};
use anyhow::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Variables bound into the issues query, derived from an
/// `"organization/repository"` path by splitting on `/`. Segments past the
/// second are silently discarded; no validation is performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVariables {
    pub organization: String,
    /// `None` when the path contains no `/`. Serializes as `null`, which the
    /// server rejects for its non-null `$repository` variable, so malformed
    /// paths fail remotely rather than locally.
    pub repository: Option<String>,
}

impl QueryVariables {
    pub fn from_path(path: &str) -> Self {
        let mut segments = path.split('/');
        let organization = segments.next().unwrap_or_default().to_string();
        let repository = segments.next().map(str::to_string);
        Self {
            organization,
            repository,
        }
    }
}

/// The raw envelope returned by the GraphQL endpoint. Either field may be
/// absent; both are surfaced as-is to the resolver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryEnvelope {
    pub data: Option<QueryData>,
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryData {
    pub organization: Option<Organization>,
}

#[async_trait]
pub trait GitHubApi {
    async fn fetch_repository_issues(
        &self,
        variables: &QueryVariables,
    ) -> Result<QueryEnvelope, Error>;
}
