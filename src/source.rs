use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Issue, IssueQuery, RepoId, RepositorySummary};

/// Read-only access to a repository and its issue list.
#[async_trait]
pub trait IssueSource: Send + Sync + std::fmt::Debug {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositorySummary>;
    async fn list_issues(&self, repo: &RepoId, query: IssueQuery) -> Result<Vec<Issue>>;
}
