use crate::domain::external_apis::github::{GitHubApi, QueryEnvelope, QueryVariables};
use crate::domain::models::issue::{GraphqlError, Organization};
use anyhow::{Context, Error};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FetchRepositoryIssuesUseCaseInput {
    /// Raw `"organization/repository"` path as submitted; passed through
    /// without validation.
    pub path: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FetchRepositoryIssuesUseCaseOutput {
    pub organization: Option<Organization>,
    pub errors: Option<Vec<GraphqlError>>,
}

#[async_trait]
pub trait FetchRepositoryIssuesUseCase {
    async fn execute(
        &self,
        input: FetchRepositoryIssuesUseCaseInput,
    ) -> Result<FetchRepositoryIssuesUseCaseOutput, Error>;
}

pub struct FetchRepositoryIssuesInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
}

impl<G: GitHubApi + Send + Sync + 'static> FetchRepositoryIssuesInteractor<G> {
    pub fn new(github_api: Arc<G>) -> Self {
        Self { github_api }
    }
}

/// Unwraps the envelope into the use-case output. Total and non-branching:
/// both fields are extracted unconditionally, each `None` when any
/// intermediate object is absent. Which one the view shows is decided at
/// render time, not here.
pub fn resolve(envelope: QueryEnvelope) -> FetchRepositoryIssuesUseCaseOutput {
    FetchRepositoryIssuesUseCaseOutput {
        organization: envelope.data.and_then(|data| data.organization),
        errors: envelope.errors,
    }
}

#[async_trait]
impl<G: GitHubApi + Send + Sync + 'static> FetchRepositoryIssuesUseCase
    for FetchRepositoryIssuesInteractor<G>
{
    async fn execute(
        &self,
        input: FetchRepositoryIssuesUseCaseInput,
    ) -> Result<FetchRepositoryIssuesUseCaseOutput, Error> {
        tracing::info!("Fetching issues for {}", input.path);
        let variables = QueryVariables::from_path(&input.path);
        let envelope = self
            .github_api
            .fetch_repository_issues(&variables)
            .await
            .with_context(|| format!("Failed to fetch issues for {}", input.path))?;
        Ok(resolve(envelope))
    }
}
