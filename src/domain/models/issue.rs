use serde::{Deserialize, Serialize};

/// An organization as returned by the issues query. `repository` is absent
/// when the queried repository does not exist under the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub url: String,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
    pub issues: IssueConnection,
}

/// GraphQL connection wrapper; only the edges' nodes are consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueConnection {
    pub edges: Vec<IssueEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueEdge {
    pub node: Issue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// A single entry of the envelope's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}
