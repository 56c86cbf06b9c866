//! Review orchestrator
//!
//! Walks every open pull request in the cache, evaluates the rule tree,
//! and, when merging is requested and the root condition passed, merges
//! through the platform API. The merge call always carries the
//! exact head SHA that was evaluated, so a concurrent push makes GitHub
//! reject the merge instead of landing the wrong commit.

use crate::config::BotConfig;
use crate::rules::{default_rule_tree, Condition, RuleNode};
use anyhow::{Context, Result};
use gh_client::{GitHubClient, MergeMethod};
use gh_state_cache::{CachedPullRequest, PrKey, StateStore};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One evaluation pass over one pull request
///
/// Serialized as-is by the dashboard, hence the camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Repository in `owner/name` form
    pub repository: String,
    pub pull_request_number: u64,
    pub pull_request_title: String,
    /// Root of the evaluated condition tree
    pub condition: Condition,
    /// What happened on the merge side of this pass
    pub merge: MergeOutcome,
}

/// Merge result recorded on a [`Review`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MergeOutcome {
    /// No merge was attempted (failing tree, status-only pass, or an
    /// empty rule tree with merging on vacuous passes disabled)
    NotAttempted,
    /// The platform accepted the merge
    Merged { sha: String },
    /// The platform refused or the call failed; the reason is recorded
    /// and the next sync pass re-checks the PR's real state
    Failed { reason: String },
}

/// Evaluates cached pull requests and merges the passing ones
pub struct ReviewEngine {
    client: Arc<dyn GitHubClient>,
    store: Arc<dyn StateStore>,
    rules: Arc<RuleNode>,
    merge_method: MergeMethod,
    merge_on_empty_rules: bool,
    max_concurrency: usize,
    abort: Arc<AtomicBool>,
}

impl ReviewEngine {
    pub fn new(
        client: Arc<dyn GitHubClient>,
        store: Arc<dyn StateStore>,
        config: &BotConfig,
    ) -> Self {
        Self {
            client,
            store,
            rules: Arc::new(default_rule_tree(config)),
            merge_method: config.merge_method,
            merge_on_empty_rules: config.merge_on_empty_rules,
            max_concurrency: config.max_concurrency.max(1),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the default rule tree
    pub fn with_rules(mut self, rules: RuleNode) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Flag that stops the engine from scheduling further remote work
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Evaluate every cached open pull request
    ///
    /// With `merge` set, PRs whose root condition passed are merged at
    /// most once per (repository, number, head SHA). A merge failure is
    /// recorded on that PR's review and never stops the others.
    pub async fn review_all(&self, merge: bool) -> Result<Vec<Review>> {
        let repos = self
            .store
            .list_repositories()
            .context("listing cached repositories")?;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Review> = JoinSet::new();
        let attempted: Arc<Mutex<HashSet<(PrKey, String)>>> =
            Arc::new(Mutex::new(HashSet::new()));

        'repos: for repo in repos {
            let prs = match self.store.list_pull_requests(&repo.key) {
                Ok(prs) => prs,
                Err(e) => {
                    error!("Failed to list cached PRs for {}: {}", repo.key, e);
                    continue;
                }
            };

            for pr in prs {
                if self.abort.load(Ordering::Relaxed) {
                    warn!("Review aborted, not scheduling remaining pull requests");
                    break 'repos;
                }
                let client = Arc::clone(&self.client);
                let rules = Arc::clone(&self.rules);
                let attempted = Arc::clone(&attempted);
                let semaphore = Arc::clone(&semaphore);
                let merge_method = self.merge_method;
                let merge_on_empty_rules = self.merge_on_empty_rules;
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    review_one(
                        client.as_ref(),
                        &rules,
                        &pr,
                        merge,
                        merge_method,
                        merge_on_empty_rules,
                        &attempted,
                    )
                    .await
                });
            }
        }

        let mut reviews = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(review) => reviews.push(review),
                Err(e) => error!("Review task failed: {}", e),
            }
        }

        reviews.sort_by(|a, b| {
            (a.repository.as_str(), a.pull_request_number)
                .cmp(&(b.repository.as_str(), b.pull_request_number))
        });
        Ok(reviews)
    }
}

/// Evaluate one pull request and, if asked and passing, merge it
///
/// Evaluation fully completes before the merge decision; the merge uses
/// the head SHA the rules saw, and the `attempted` set guarantees at
/// most one merge call per (repository, number, head SHA) per run.
async fn review_one(
    client: &dyn GitHubClient,
    rules: &RuleNode,
    pr: &CachedPullRequest,
    merge: bool,
    merge_method: MergeMethod,
    merge_on_empty_rules: bool,
    attempted: &Mutex<HashSet<(PrKey, String)>>,
) -> Review {
    let condition = rules.evaluate(pr, client).await;

    let mut outcome = MergeOutcome::NotAttempted;
    if merge && condition.passed {
        if rules.leaf_count() == 0 && !merge_on_empty_rules {
            debug!(
                "{} passes vacuously (no rules configured), merging disabled",
                pr.key
            );
        } else {
            let head_sha = pr.snapshot.head_sha.clone();
            let first_attempt = attempted
                .lock()
                .unwrap()
                .insert((pr.key.clone(), head_sha.clone()));
            if first_attempt {
                outcome = merge_one(client, pr, &head_sha, merge_method).await;
            }
        }
    }

    Review {
        repository: pr.key.repo.to_string(),
        pull_request_number: pr.key.number,
        pull_request_title: pr.snapshot.title.clone(),
        condition,
        merge: outcome,
    }
}

async fn merge_one(
    client: &dyn GitHubClient,
    pr: &CachedPullRequest,
    evaluated_head_sha: &str,
    method: MergeMethod,
) -> MergeOutcome {
    match client
        .merge_pull_request(
            &pr.key.repo.owner,
            &pr.key.repo.name,
            pr.key.number,
            evaluated_head_sha,
            method,
        )
        .await
    {
        Ok(result) if result.merged => {
            let sha = result.sha.unwrap_or_else(|| evaluated_head_sha.to_string());
            info!("Merged {} at {}", pr.key, sha);
            MergeOutcome::Merged { sha }
        }
        Ok(result) => {
            warn!("Merge of {} refused: {}", pr.key, result.message);
            MergeOutcome::Failed {
                reason: result.message,
            }
        }
        Err(e) => {
            warn!("Merge of {} failed: {}", pr.key, e);
            MergeOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
