use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CommitSummary, GitHubUser, Repository, TreeEntry};

/// Read access to repositories, keyed by full repository name (`owner/name`).
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn get_user(&self, username: &str) -> Result<GitHubUser>;

    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>>;

    async fn get_tree(
        &self,
        full_name: &str,
        git_ref: &str,
        recursive: bool,
    ) -> Result<Vec<TreeEntry>>;

    async fn get_file_content(&self, full_name: &str, path: &str) -> Result<Vec<u8>>;

    /// `Ok(None)` when the repository has no README.
    async fn get_readme(&self, full_name: &str) -> Result<Option<Vec<u8>>>;

    /// Most recent commits first.
    async fn list_commits(&self, full_name: &str, per_page: u32) -> Result<Vec<CommitSummary>>;
}
