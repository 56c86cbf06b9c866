//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab
//! library. Endpoints octocrab models well go through its typed builders;
//! the rest (authenticated-user repos, pull request reviews, the merge
//! call) use raw routes with explicit response structs.

use crate::client::{GitHubClient, Result};
use crate::error::ClientError;
use crate::types::{
    ApprovalStatus, CiState, CiStatus, MergeMethod, MergeResult, PrState, PullRequest, Repository,
};
use async_trait::async_trait;
use log::debug;
use octocrab::Octocrab;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

const PER_PAGE: u8 = 100;

/// Direct GitHub API client using octocrab
///
/// This is the base implementation that makes actual API calls.
/// It can be wrapped by `RetryingClient` to add timeout/backoff behavior.
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// Get a reference to the underlying octocrab instance
    pub fn octocrab(&self) -> &Octocrab {
        &self.octocrab
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: RepoOwnerResponse,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoOwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    user: Option<ReviewUserResponse>,
    state: String,
}

#[derive(Debug, Deserialize)]
struct ReviewUserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    merged: bool,
    sha: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        debug!("Listing repositories for the authenticated user");

        let octocrab = Arc::clone(&self.octocrab);
        let raw = drain_pages(PER_PAGE, move |page| {
            let octocrab = Arc::clone(&octocrab);
            async move {
                let route = format!("/user/repos?per_page={}&page={}", PER_PAGE, page);
                let repos: Vec<RepoResponse> = octocrab
                    .get(route, None::<&()>)
                    .await
                    .map_err(ClientError::from_octocrab)?;
                Ok(repos)
            }
        })
        .await?;

        let repos = raw
            .into_iter()
            .map(|r| Repository {
                owner: r.owner.login,
                name: r.name,
                default_branch: r.default_branch.unwrap_or_else(|| "main".to_string()),
            })
            .collect::<Vec<_>>();

        debug!("Found {} repositories", repos.len());
        Ok(repos)
    }

    async fn list_open_pull_requests(&self, owner: &str, repo: &str)
        -> Result<Vec<PullRequest>> {
        debug!("Listing open PRs for {}/{}", owner, repo);

        let octocrab = Arc::clone(&self.octocrab);
        let owner_owned = owner.to_string();
        let repo_owned = repo.to_string();
        let raw = drain_pages(PER_PAGE, move |page| {
            let octocrab = Arc::clone(&octocrab);
            let owner = owner_owned.clone();
            let repo = repo_owned.clone();
            async move {
                let result = octocrab
                    .pulls(owner.as_str(), repo.as_str())
                    .list()
                    .state(octocrab::params::State::Open)
                    .per_page(PER_PAGE)
                    .page(page)
                    .send()
                    .await
                    .map_err(ClientError::from_octocrab)?;
                Ok(result.items)
            }
        })
        .await?;

        let prs = raw.iter().map(convert_pull_request).collect::<Vec<_>>();
        debug!("Found {} open PRs for {}/{}", prs.len(), owner, repo);
        Ok(prs)
    }

    async fn fetch_pull_request(&self, owner: &str, repo: &str, number: u64)
        -> Result<PullRequest> {
        debug!("Fetching PR {}/{}#{}", owner, repo, number);

        let pr = self
            .octocrab
            .pulls(owner, repo)
            .get(number)
            .await
            .map_err(ClientError::from_octocrab)?;

        Ok(convert_pull_request(&pr))
    }

    async fn fetch_ci_status(&self, owner: &str, repo: &str, head_sha: &str)
        -> Result<CiStatus> {
        debug!("Fetching CI status for {}/{} @ {}", owner, repo, head_sha);

        let checks = self
            .octocrab
            .checks(owner, repo)
            .list_check_runs_for_git_ref(head_sha.to_string().into())
            .send()
            .await
            .map_err(ClientError::from_octocrab)?;

        let outcomes = checks
            .check_runs
            .into_iter()
            .map(|run| CheckOutcome {
                completed: run.completed_at.is_some(),
                conclusion: run.conclusion,
            })
            .collect::<Vec<_>>();

        Ok(aggregate_checks(&outcomes))
    }

    async fn fetch_approvals(&self, owner: &str, repo: &str, number: u64)
        -> Result<ApprovalStatus> {
        debug!("Fetching reviews for {}/{}#{}", owner, repo, number);

        let octocrab = Arc::clone(&self.octocrab);
        let owner_owned = owner.to_string();
        let repo_owned = repo.to_string();
        let reviews = drain_pages(PER_PAGE, move |page| {
            let octocrab = Arc::clone(&octocrab);
            let owner = owner_owned.clone();
            let repo = repo_owned.clone();
            async move {
                let route = format!(
                    "/repos/{}/{}/pulls/{}/reviews?per_page={}&page={}",
                    owner, repo, number, PER_PAGE, page
                );
                let reviews: Vec<ReviewResponse> = octocrab
                    .get(route, None::<&()>)
                    .await
                    .map_err(ClientError::from_octocrab)?;
                Ok(reviews)
            }
        })
        .await?;

        Ok(resolve_approvals(&reviews))
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        expected_head_sha: &str,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        debug!(
            "Merging {}/{}#{} at {} ({})",
            owner,
            repo,
            number,
            expected_head_sha,
            method.as_api_str()
        );

        let route = format!("/repos/{}/{}/pulls/{}/merge", owner, repo, number);
        let body = serde_json::json!({
            "sha": expected_head_sha,
            "merge_method": method.as_api_str(),
        });

        let response: MergeResponse = self
            .octocrab
            .put(route, Some(&body))
            .await
            .map_err(ClientError::from_octocrab)?;

        Ok(MergeResult {
            merged: response.merged,
            sha: response.sha,
            message: response.message.unwrap_or_default(),
        })
    }
}

/// Fetch pages until one comes back short
///
/// The remote API returns bounded pages; callers must not depend on any
/// particular page size, so this keeps requesting until a page holds fewer
/// than `per_page` items.
async fn drain_pages<T, F, Fut>(per_page: u8, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let items = fetch_page(page).await?;
        let count = items.len();
        all.extend(items);

        if count < per_page as usize {
            break;
        }
        page += 1;
    }

    Ok(all)
}

/// Convert octocrab PullRequest to our PullRequest type
fn convert_pull_request(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = if pr.merged_at.is_some() {
        PrState::Merged
    } else {
        match pr.state {
            Some(octocrab::models::IssueState::Closed) => PrState::Closed,
            _ => PrState::Open,
        }
    };

    PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        head_sha: pr.head.sha.clone(),
        base_branch: pr.base.ref_field.clone(),
        state,
        mergeable: pr.mergeable,
        requested_reviewers: pr
            .requested_reviewers
            .as_ref()
            .map(|users| users.iter().map(|u| u.login.clone()).collect())
            .unwrap_or_default(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
        updated_at: pr.updated_at.unwrap_or_else(chrono::Utc::now),
        html_url: pr
            .html_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default(),
    }
}

struct CheckOutcome {
    completed: bool,
    conclusion: Option<String>,
}

/// Aggregate individual check runs into a single CI status
///
/// A run that completed with a `success`, `neutral`, or `skipped`
/// conclusion counts as passed; any other completed run counts as failed;
/// anything not yet completed is pending.
fn aggregate_checks(outcomes: &[CheckOutcome]) -> CiStatus {
    let mut passed = 0;
    let mut failed = 0;
    let mut pending = 0;

    for outcome in outcomes {
        if !outcome.completed {
            pending += 1;
            continue;
        }
        match outcome.conclusion.as_deref() {
            Some("success" | "neutral" | "skipped") => passed += 1,
            _ => failed += 1,
        }
    }

    let state = if failed > 0 {
        CiState::Failure
    } else if pending > 0 {
        CiState::Pending
    } else if passed > 0 {
        CiState::Success
    } else {
        CiState::Unknown
    };

    CiStatus {
        state,
        total_checks: outcomes.len(),
        passed,
        failed,
        pending,
    }
}

/// Reduce a review timeline to the standing approval state
///
/// Reviews arrive oldest-first; an `APPROVED` or `CHANGES_REQUESTED`
/// review replaces the reviewer's earlier verdict, a `DISMISSED` review
/// clears it, and comment-only reviews leave it untouched.
fn resolve_approvals(reviews: &[ReviewResponse]) -> ApprovalStatus {
    let mut latest: HashMap<String, String> = HashMap::new();

    for review in reviews {
        let Some(user) = &review.user else {
            continue;
        };
        match review.state.as_str() {
            "APPROVED" | "CHANGES_REQUESTED" => {
                latest.insert(user.login.clone(), review.state.clone());
            }
            "DISMISSED" => {
                latest.remove(&user.login);
            }
            _ => {}
        }
    }

    let mut status = ApprovalStatus::default();
    for (login, state) in latest {
        if state == "APPROVED" {
            status.approved_by.push(login);
        } else {
            status.changes_requested_by.push(login);
        }
    }
    status.approved_by.sort();
    status.changes_requested_by.sort();
    status
}
