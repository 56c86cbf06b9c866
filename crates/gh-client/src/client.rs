//! GitHub client trait
//!
//! This module defines the core `GitHubClient` trait that all client
//! implementations must satisfy. Implementations can be direct (hitting
//! the API) or decorated with retry/timeout logic.

use crate::error::ClientError;
use crate::types::{
    ApprovalStatus, CiStatus, MergeMethod, MergeResult, PullRequest, Repository,
};
use async_trait::async_trait;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// GitHub API client trait
///
/// Defines the interface for interacting with the GitHub API.
/// Listing operations drain every page the API returns; callers always
/// see complete result sets regardless of the remote page size.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks and threads.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{GitHubClient, PullRequest};
///
/// async fn list_open(client: &dyn GitHubClient) -> gh_client::client::Result<Vec<PullRequest>> {
///     client.list_open_pull_requests("rust-lang", "rust").await
/// }
/// ```
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// List all repositories visible to the configured credential
    ///
    /// # Returns
    ///
    /// Every repository the credential can see, across all pages.
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// List open pull requests for a repository
    ///
    /// # Arguments
    ///
    /// * `owner` - Repository owner (user or organization)
    /// * `repo` - Repository name
    ///
    /// # Returns
    ///
    /// Every open pull request, across all pages. The list endpoint does
    /// not report mergeability; use [`fetch_pull_request`] for that.
    ///
    /// [`fetch_pull_request`]: Self::fetch_pull_request
    async fn list_open_pull_requests(&self, owner: &str, repo: &str)
        -> Result<Vec<PullRequest>>;

    /// Fetch a single pull request by number
    ///
    /// This returns the full PR detail including the mergeable flag,
    /// which the list endpoint leaves unset.
    async fn fetch_pull_request(&self, owner: &str, repo: &str, number: u64)
        -> Result<PullRequest>;

    /// Fetch aggregated CI status for a commit
    ///
    /// This fetches all check runs for a commit and aggregates them into
    /// a single status. The aggregation logic is:
    /// - Any failure → Failure
    /// - Any pending (and no failure) → Pending
    /// - All success → Success
    /// - No checks → Unknown
    async fn fetch_ci_status(&self, owner: &str, repo: &str, head_sha: &str)
        -> Result<CiStatus>;

    /// Fetch the current review/approval state of a pull request
    ///
    /// Only the latest review from each reviewer counts; earlier reviews
    /// superseded by a newer one from the same reviewer are ignored.
    async fn fetch_approvals(&self, owner: &str, repo: &str, number: u64)
        -> Result<ApprovalStatus>;

    /// Merge a pull request
    ///
    /// # Arguments
    ///
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    /// * `number` - Pull request number
    /// * `expected_head_sha` - The head SHA the decision was made against;
    ///   GitHub rejects the merge if the branch has moved past it
    /// * `method` - How to merge (merge commit, squash, or rebase)
    ///
    /// # Returns
    ///
    /// The merge outcome. A stale `expected_head_sha` surfaces as
    /// [`ClientError::Rejected`](crate::ClientError::Rejected).
    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        expected_head_sha: &str,
        method: MergeMethod,
    ) -> Result<MergeResult>;
}
