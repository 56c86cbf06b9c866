//! GitHub API data transfer objects
//!
//! These types represent the data returned from the GitHub API.
//! They are intentionally separate from application domain models
//! to keep this crate pure and reusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository visible to the configured credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Repository owner (user or organization)
    pub owner: String,

    /// Repository name
    pub name: String,

    /// Default branch name (e.g., "main")
    pub default_branch: String,
}

impl Repository {
    /// Full name in `owner/name` form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A pull request from the GitHub API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 123)
    pub number: u64,

    /// PR title
    pub title: String,

    /// Author's GitHub username
    pub author: String,

    /// HEAD commit SHA
    pub head_sha: String,

    /// Base branch name (e.g., "main")
    pub base_branch: String,

    /// Open, closed, or merged
    pub state: PrState,

    /// Whether the PR is mergeable (None if not yet computed by GitHub)
    pub mergeable: Option<bool>,

    /// Usernames whose review has been requested
    pub requested_reviewers: Vec<String>,

    /// Label names currently on the PR
    pub labels: Vec<String>,

    /// When the PR was last updated
    pub updated_at: DateTime<Utc>,

    /// PR URL for opening in browser
    pub html_url: String,
}

/// Pull request state as reported by GitHub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    /// The PR is open
    #[default]
    Open,
    /// The PR was closed without merging
    Closed,
    /// The PR was merged
    Merged,
}

/// Merge method for pull requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    #[default]
    Squash,
    /// Rebase commits onto the base branch
    Rebase,
}

impl MergeMethod {
    /// The string the merge endpoint expects
    pub fn as_api_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

/// Result of a merge operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// Commit SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation
    pub message: String,
}

/// Current review/approval state of a pull request
///
/// GitHub reports one review per (reviewer, event); only the latest review
/// from each reviewer counts, which the client resolves before returning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalStatus {
    /// Reviewers whose latest review approved the PR
    pub approved_by: Vec<String>,
    /// Reviewers whose latest review requested changes
    pub changes_requested_by: Vec<String>,
}

impl ApprovalStatus {
    /// Number of currently-standing approvals
    pub fn approvals(&self) -> usize {
        self.approved_by.len()
    }
}

/// Aggregated CI status from check runs
///
/// This represents the combined status of all CI check runs for a commit,
/// aggregated into a single overall state with counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiStatus {
    /// Overall CI state (aggregated from all check runs)
    pub state: CiState,
    /// Total number of check runs
    pub total_checks: usize,
    /// Number of passed checks
    pub passed: usize,
    /// Number of failed checks
    pub failed: usize,
    /// Number of pending/in-progress checks
    pub pending: usize,
}

/// Aggregated CI state
///
/// Represents the overall state of CI for a commit:
/// - Any failure → Failure
/// - Any pending (and no failure) → Pending
/// - All success → Success
/// - No checks → Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiState {
    /// All checks passed
    Success,
    /// At least one check failed
    Failure,
    /// At least one check is pending/in-progress (no failures)
    Pending,
    /// No checks found or status unknown
    Unknown,
}
