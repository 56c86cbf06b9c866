//! GitHub API client with retry support
//!
//! This crate provides a trait-based GitHub API client with optional retry
//! behavior. The design follows the decorator pattern, allowing timeout and
//! backoff handling to be composed with the base client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              GitHubClient trait                  │
//! │  - list_repositories()                           │
//! │  - list_open_pull_requests()                     │
//! │  - fetch_ci_status()                             │
//! │  - merge_pull_request()                          │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ OctocrabClient  │         │ RetryingClient      │
//! │ (direct API)    │◄────────│ (decorator)         │
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{GitHubClient, OctocrabClient, RetryingClient, RetryPolicy};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), gh_client::ClientError> {
//! let octocrab = octocrab::Octocrab::builder()
//!     .personal_token("token".to_string())
//!     .build()
//!     .unwrap();
//!
//! // Direct client (no retries)
//! let direct = OctocrabClient::new(Arc::new(octocrab));
//!
//! // Retrying client with timeouts and bounded backoff
//! let client = RetryingClient::new(direct, RetryPolicy::default());
//!
//! let repos = client.list_repositories().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod octocrab_client;
pub mod retrying_client;
pub mod types;

pub use client::GitHubClient;
pub use error::ClientError;
pub use octocrab_client::OctocrabClient;
pub use retrying_client::{RetryPolicy, RetryingClient};
pub use types::{
    ApprovalStatus, CiState, CiStatus, MergeMethod, MergeResult, PrState, PullRequest, Repository,
};

// Re-export octocrab so consumers don't need to depend on it directly
pub use octocrab;
