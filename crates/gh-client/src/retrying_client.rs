//! Retrying GitHub API client (decorator pattern)
//!
//! Wraps any `GitHubClient` implementation to add per-call timeouts and
//! bounded backoff-retry for rate-limit and transient network errors.
//! Permanent errors (not found, permission denied, rejected merges) pass
//! straight through to the caller.

use crate::client::{GitHubClient, Result};
use crate::error::ClientError;
use crate::types::{
    ApprovalStatus, CiStatus, MergeMethod, MergeResult, PullRequest, Repository,
};
use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;

/// Retry behavior for a [`RetryingClient`]
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
    /// Per-attempt timeout applied to every remote call
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Retrying GitHub API client using the decorator pattern
///
/// Wraps an inner `GitHubClient` and retries calls that failed with a
/// retryable error, sleeping an exponentially growing backoff between
/// attempts. Each attempt is bounded by the policy timeout so a stuck
/// remote call cannot block its caller indefinitely.
#[derive(Debug, Clone)]
pub struct RetryingClient<C: GitHubClient> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: GitHubClient> RetryingClient<C> {
    /// Create a new retrying client
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Get a reference to the inner client
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;

        loop {
            let result = match tokio::time::timeout(self.policy.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Transient(format!(
                    "{} timed out after {:?}",
                    operation, self.policy.timeout
                ))),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        operation, err, attempt, self.policy.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!("{} failed without retry: {}", operation, err);
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl<C: GitHubClient> GitHubClient for RetryingClient<C> {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.run("list_repositories", || self.inner.list_repositories())
            .await
    }

    async fn list_open_pull_requests(&self, owner: &str, repo: &str)
        -> Result<Vec<PullRequest>> {
        self.run("list_open_pull_requests", || {
            self.inner.list_open_pull_requests(owner, repo)
        })
        .await
    }

    async fn fetch_pull_request(&self, owner: &str, repo: &str, number: u64)
        -> Result<PullRequest> {
        self.run("fetch_pull_request", || {
            self.inner.fetch_pull_request(owner, repo, number)
        })
        .await
    }

    async fn fetch_ci_status(&self, owner: &str, repo: &str, head_sha: &str)
        -> Result<CiStatus> {
        self.run("fetch_ci_status", || {
            self.inner.fetch_ci_status(owner, repo, head_sha)
        })
        .await
    }

    async fn fetch_approvals(&self, owner: &str, repo: &str, number: u64)
        -> Result<ApprovalStatus> {
        self.run("fetch_approvals", || {
            self.inner.fetch_approvals(owner, repo, number)
        })
        .await
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        expected_head_sha: &str,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        // Merges are not retried on transient failure: an ambiguous merge
        // must be resolved by the next sync pass, not by firing it again.
        match tokio::time::timeout(
            self.policy.timeout,
            self.inner
                .merge_pull_request(owner, repo, number, expected_head_sha, method),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Transient(format!(
                "merge_pull_request timed out after {:?}",
                self.policy.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Inner client that fails a configurable number of times per call.
    struct FlakyClient {
        failures_remaining: AtomicU32,
        error: fn(String) -> ClientError,
        merge_calls: Mutex<Vec<(u64, String)>>,
    }

    impl FlakyClient {
        fn failing(times: u32, error: fn(String) -> ClientError) -> Self {
            Self {
                failures_remaining: AtomicU32::new(times),
                error,
                merge_calls: Mutex::new(Vec::new()),
            }
        }

        fn take_failure(&self) -> bool {
            self.failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    fn sample_pr(number: u64) -> PullRequest {
        PullRequest {
            number,
            title: "t".into(),
            author: "a".into(),
            head_sha: "sha".into(),
            base_branch: "main".into(),
            state: PrState::Open,
            mergeable: Some(true),
            requested_reviewers: vec![],
            labels: vec![],
            updated_at: chrono::Utc::now(),
            html_url: String::new(),
        }
    }

    #[async_trait]
    impl GitHubClient for FlakyClient {
        async fn list_repositories(&self) -> Result<Vec<Repository>> {
            if self.take_failure() {
                return Err((self.error)("injected".into()));
            }
            Ok(vec![])
        }

        async fn list_open_pull_requests(&self, _owner: &str, _repo: &str)
            -> Result<Vec<PullRequest>> {
            if self.take_failure() {
                return Err((self.error)("injected".into()));
            }
            Ok(vec![sample_pr(1)])
        }

        async fn fetch_pull_request(&self, _owner: &str, _repo: &str, number: u64)
            -> Result<PullRequest> {
            Ok(sample_pr(number))
        }

        async fn fetch_ci_status(&self, _owner: &str, _repo: &str, _sha: &str)
            -> Result<CiStatus> {
            Err(ClientError::NotFound("no such commit".into()))
        }

        async fn fetch_approvals(&self, _owner: &str, _repo: &str, _number: u64)
            -> Result<ApprovalStatus> {
            Ok(ApprovalStatus::default())
        }

        async fn merge_pull_request(
            &self,
            _owner: &str,
            _repo: &str,
            number: u64,
            expected_head_sha: &str,
            _method: MergeMethod,
        ) -> Result<MergeResult> {
            self.merge_calls
                .lock()
                .unwrap()
                .push((number, expected_head_sha.to_string()));
            if self.take_failure() {
                return Err((self.error)("injected".into()));
            }
            Ok(MergeResult {
                merged: true,
                sha: Some("merged".into()),
                message: String::new(),
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let client = RetryingClient::new(
            FlakyClient::failing(2, ClientError::Transient),
            fast_policy(),
        );
        assert!(client.list_repositories().await.is_ok());
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let client = RetryingClient::new(
            FlakyClient::failing(3, ClientError::RateLimited),
            fast_policy(),
        );
        let err = client.list_repositories().await.unwrap_err();
        assert!(matches!(err, ClientError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let client = RetryingClient::new(
            FlakyClient::failing(2, ClientError::PermissionDenied),
            fast_policy(),
        );
        let err = client.list_repositories().await.unwrap_err();
        assert!(matches!(err, ClientError::PermissionDenied(_)));
        // One failure consumed, one left: the call was not repeated.
        assert!(client.inner().take_failure());
        assert!(!client.inner().take_failure());
    }

    #[tokio::test]
    async fn test_merge_not_retried_on_transient_failure() {
        let client = RetryingClient::new(
            FlakyClient::failing(1, ClientError::Transient),
            fast_policy(),
        );
        let err = client
            .merge_pull_request("acme", "widgets", 42, "abc123", MergeMethod::Squash)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transient(_)));
        assert_eq!(client.inner().merge_calls.lock().unwrap().len(), 1);
    }
}
