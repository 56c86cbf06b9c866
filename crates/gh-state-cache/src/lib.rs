//! Snapshot store for synchronized repository/PR state
//!
//! The sync engine writes the last-known state of every repository and
//! open pull request here; the review engine reads it back. Records are
//! addressed by composite keys (`owner/name`, `owner/name#number`) and a
//! repository's pull requests can be listed as a group, which is what
//! reconciliation needs to notice externally merged or closed PRs.
//!
//! Two implementations are provided: [`MemoryStore`] for tests and
//! short-lived runs, and [`JsonFileStore`] which persists the snapshot
//! to a JSON file across runs.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Another writer panicked while holding the store lock.
    #[error("cache lock poisoned")]
    Poisoned,
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Composite key identifying a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoKey {
    pub owner: String,
    pub name: String,
}

impl RepoKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Composite key identifying a pull request within a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrKey {
    pub repo: RepoKey,
    pub number: u64,
}

impl PrKey {
    pub fn new(repo: RepoKey, number: u64) -> Self {
        Self { repo, number }
    }
}

impl fmt::Display for PrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Last-synchronized state of a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRepository {
    pub key: RepoKey,
    pub default_branch: String,
    /// When the sync engine last wrote this record
    pub synced_at: DateTime<Utc>,
}

/// Last-synchronized snapshot of a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPullRequest {
    pub key: PrKey,
    /// The normalized API snapshot (head SHA, mergeable flag, reviewers, ...)
    pub snapshot: gh_client::PullRequest,
    /// When the sync engine last wrote this record
    pub synced_at: DateTime<Utc>,
}

/// Store of synchronized repository/PR snapshots
///
/// Writes are per-key upserts with no cross-key transaction; the sync
/// engine is the sole writer, so last-writer-wins per key is sufficient.
/// Implementations must be `Send + Sync`.
pub trait StateStore: Send + Sync {
    /// Insert or replace a repository record
    fn upsert_repository(&self, repo: CachedRepository) -> Result<()>;

    /// List every cached repository
    fn list_repositories(&self) -> Result<Vec<CachedRepository>>;

    /// Remove a repository and every pull request cached under it
    fn delete_repository(&self, key: &RepoKey) -> Result<()>;

    /// Insert or replace a pull request record
    fn upsert_pull_request(&self, pr: CachedPullRequest) -> Result<()>;

    /// Look up a single pull request
    fn get_pull_request(&self, key: &PrKey) -> Result<Option<CachedPullRequest>>;

    /// List every pull request cached under a repository
    fn list_pull_requests(&self, repo: &RepoKey) -> Result<Vec<CachedPullRequest>>;

    /// Remove a single pull request
    fn delete_pull_request(&self, key: &PrKey) -> Result<()>;
}
