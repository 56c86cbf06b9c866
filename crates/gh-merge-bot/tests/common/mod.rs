//! Mock GitHub client for integration tests
//!
//! Implements `GitHubClient` against in-memory maps, with call tracking
//! and error injection. Merging behaves like the real platform: the
//! expected head SHA must match the PR's current head, and a merged PR
//! disappears from the open listing.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use gh_client::{
    ApprovalStatus, CiState, CiStatus, ClientError, GitHubClient, MergeMethod, MergeResult,
    PrState, PullRequest, Repository,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub repo: String,
    pub number: u64,
    pub sha: String,
    pub method: MergeMethod,
}

#[derive(Default)]
pub struct MockGitHubClient {
    repositories: Mutex<Vec<Repository>>,
    open_prs: Mutex<HashMap<String, Vec<PullRequest>>>,
    ci: Mutex<HashMap<String, CiStatus>>,
    approvals: Mutex<HashMap<(String, u64), ApprovalStatus>>,
    // Call tracking
    list_pr_calls: Mutex<Vec<String>>,
    merge_calls: Mutex<Vec<MergeCall>>,
    // Error injection
    fail_list_prs_for: Mutex<HashSet<String>>,
    fail_ci_for_sha: Mutex<HashSet<String>>,
    fail_merge_with: Mutex<Option<String>>,
}

/// Build an open PR with sensible defaults
pub fn open_pr(number: u64, title: &str, head_sha: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        author: "alice".to_string(),
        head_sha: head_sha.to_string(),
        base_branch: "main".to_string(),
        state: PrState::Open,
        mergeable: Some(true),
        requested_reviewers: vec![],
        labels: vec![],
        updated_at: Utc::now(),
        html_url: format!("https://github.com/acme/widgets/pull/{}", number),
    }
}

pub fn ci_success(checks: usize) -> CiStatus {
    CiStatus {
        state: CiState::Success,
        total_checks: checks,
        passed: checks,
        failed: 0,
        pending: 0,
    }
}

pub fn ci_failure(failed: usize, total: usize) -> CiStatus {
    CiStatus {
        state: CiState::Failure,
        total_checks: total,
        passed: total - failed,
        failed,
        pending: 0,
    }
}

impl MockGitHubClient {
    pub fn new() -> Self {
        Self::default()
    }

    // === Setup ===

    pub fn add_repository(&self, owner: &str, name: &str) {
        self.repositories.lock().unwrap().push(Repository {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: "main".to_string(),
        });
    }

    pub fn add_open_pr(&self, owner: &str, name: &str, pr: PullRequest) {
        self.open_prs
            .lock()
            .unwrap()
            .entry(format!("{}/{}", owner, name))
            .or_default()
            .push(pr);
    }

    pub fn remove_open_pr(&self, owner: &str, name: &str, number: u64) {
        if let Some(prs) = self
            .open_prs
            .lock()
            .unwrap()
            .get_mut(&format!("{}/{}", owner, name))
        {
            prs.retain(|pr| pr.number != number);
        }
    }

    /// Simulate a push to the PR branch after the last sync
    pub fn push_new_head(&self, owner: &str, name: &str, number: u64, new_sha: &str) {
        if let Some(prs) = self
            .open_prs
            .lock()
            .unwrap()
            .get_mut(&format!("{}/{}", owner, name))
        {
            for pr in prs.iter_mut().filter(|pr| pr.number == number) {
                pr.head_sha = new_sha.to_string();
            }
        }
    }

    pub fn set_ci(&self, head_sha: &str, status: CiStatus) {
        self.ci.lock().unwrap().insert(head_sha.to_string(), status);
    }

    pub fn approve(&self, owner: &str, name: &str, number: u64, reviewer: &str) {
        self.approvals
            .lock()
            .unwrap()
            .entry((format!("{}/{}", owner, name), number))
            .or_default()
            .approved_by
            .push(reviewer.to_string());
    }

    // === Error injection ===

    pub fn fail_pr_listing(&self, owner: &str, name: &str) {
        self.fail_list_prs_for
            .lock()
            .unwrap()
            .insert(format!("{}/{}", owner, name));
    }

    pub fn fail_ci_for(&self, head_sha: &str) {
        self.fail_ci_for_sha
            .lock()
            .unwrap()
            .insert(head_sha.to_string());
    }

    pub fn fail_merges(&self, reason: &str) {
        *self.fail_merge_with.lock().unwrap() = Some(reason.to_string());
    }

    // === Call verification ===

    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn merge_call_count(&self) -> usize {
        self.merge_calls.lock().unwrap().len()
    }

    pub fn list_pr_calls(&self) -> Vec<String> {
        self.list_pr_calls.lock().unwrap().clone()
    }

    pub fn assert_merge_called_once_with(&self, repo: &str, number: u64, sha: &str) {
        let calls = self.merge_calls();
        let matching: Vec<_> = calls
            .iter()
            .filter(|c| c.repo == repo && c.number == number && c.sha == sha)
            .collect();
        assert_eq!(
            matching.len(),
            1,
            "Expected exactly one merge({}, {}, {}) but got: {:?}",
            repo,
            number,
            sha,
            calls
        );
    }

    pub fn assert_merge_not_called(&self, repo: &str, number: u64) {
        let calls = self.merge_calls();
        assert!(
            !calls.iter().any(|c| c.repo == repo && c.number == number),
            "Expected merge_pull_request({}, {}) NOT to be called but it was: {:?}",
            repo,
            number,
            calls
        );
    }
}

#[async_trait]
impl GitHubClient for MockGitHubClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        Ok(self.repositories.lock().unwrap().clone())
    }

    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<PullRequest>, ClientError> {
        let key = format!("{}/{}", owner, repo);
        self.list_pr_calls.lock().unwrap().push(key.clone());

        if self.fail_list_prs_for.lock().unwrap().contains(&key) {
            return Err(ClientError::Transient("injected listing failure".into()));
        }

        Ok(self
            .open_prs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ClientError> {
        let key = format!("{}/{}", owner, repo);
        self.open_prs
            .lock()
            .unwrap()
            .get(&key)
            .and_then(|prs| prs.iter().find(|pr| pr.number == number))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{}#{}", key, number)))
    }

    async fn fetch_ci_status(
        &self,
        _owner: &str,
        _repo: &str,
        head_sha: &str,
    ) -> Result<CiStatus, ClientError> {
        if self.fail_ci_for_sha.lock().unwrap().contains(head_sha) {
            return Err(ClientError::Transient("injected CI fetch failure".into()));
        }

        Ok(self
            .ci
            .lock()
            .unwrap()
            .get(head_sha)
            .cloned()
            .unwrap_or(CiStatus {
                state: CiState::Unknown,
                total_checks: 0,
                passed: 0,
                failed: 0,
                pending: 0,
            }))
    }

    async fn fetch_approvals(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<ApprovalStatus, ClientError> {
        Ok(self
            .approvals
            .lock()
            .unwrap()
            .get(&(format!("{}/{}", owner, repo), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        expected_head_sha: &str,
        method: MergeMethod,
    ) -> Result<MergeResult, ClientError> {
        let key = format!("{}/{}", owner, repo);
        self.merge_calls.lock().unwrap().push(MergeCall {
            repo: key.clone(),
            number,
            sha: expected_head_sha.to_string(),
            method,
        });

        if let Some(reason) = self.fail_merge_with.lock().unwrap().as_ref() {
            return Err(ClientError::Rejected(reason.clone()));
        }

        let mut open_prs = self.open_prs.lock().unwrap();
        let prs = open_prs
            .get_mut(&key)
            .ok_or_else(|| ClientError::NotFound(key.clone()))?;
        let Some(pr) = prs.iter().find(|pr| pr.number == number) else {
            return Err(ClientError::Rejected(format!(
                "{}#{} is not open",
                key, number
            )));
        };

        if pr.head_sha != expected_head_sha {
            return Err(ClientError::Rejected(
                "Head branch was modified. Review and try the merge again.".into(),
            ));
        }

        // A merged PR leaves the open set, like on the real platform.
        prs.retain(|pr| pr.number != number);
        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merge-of-{}", expected_head_sha)),
            message: "Pull Request successfully merged".to_string(),
        })
    }
}
