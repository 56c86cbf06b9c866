//! Client error taxonomy
//!
//! Callers need to tell apart errors that deserve a retry (rate limits,
//! flaky network) from errors that are facts about the remote state
//! (not found, permission denied, merge rejected). The sync and review
//! engines branch on these variants, so the mapping from octocrab errors
//! lives here rather than at each call site.

use thiserror::Error;

/// Errors returned by [`GitHubClient`](crate::GitHubClient) implementations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API rate limit was hit; retry after backing off.
    #[error("rate limited by the GitHub API: {0}")]
    RateLimited(String),

    /// Network-level or timeout failure; safe to retry.
    #[error("transient error talking to GitHub: {0}")]
    Transient(String),

    /// The requested entity does not exist (or is not visible).
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The remote refused the operation (e.g. stale head SHA on merge,
    /// protected branch). Retrying without a state change will not help.
    #[error("rejected by GitHub: {0}")]
    Rejected(String),

    /// Any other error reported by the API.
    #[error("GitHub API error: {0}")]
    Api(String),
}

impl ClientError {
    /// Whether a bounded retry is worthwhile for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::RateLimited(_) | ClientError::Transient(_))
    }

    /// Classify an octocrab error.
    ///
    /// Errors carrying a GitHub response are mapped by status code; the
    /// ambiguous 403 is split on the rate-limit message GitHub attaches.
    /// Everything else (transport, serialization) is treated as transient
    /// so the retry decorator gets a chance before the error surfaces.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                let message = source.message.clone();
                match status {
                    404 => ClientError::NotFound(message),
                    429 => ClientError::RateLimited(message),
                    403 if message.to_lowercase().contains("rate limit") => {
                        ClientError::RateLimited(message)
                    }
                    401 | 403 => ClientError::PermissionDenied(message),
                    405 | 409 | 422 => ClientError::Rejected(message),
                    _ => ClientError::Api(format!("{} ({})", message, status)),
                }
            }
            other => ClientError::Transient(other.to_string()),
        }
    }
}
