//! Synchronization engine
//!
//! Refreshes the cached view of GitHub: every visible repository, every
//! open pull request, one normalized snapshot per PR. Repositories are
//! synced concurrently under a bounded worker pool; one broken repository
//! is logged and skipped without aborting the pass. Cached entries whose
//! PR is no longer open are removed so later review passes cannot act on
//! stale state.

use anyhow::{Context, Result};
use chrono::Utc;
use gh_client::{GitHubClient, PrState, Repository};
use gh_state_cache::{CachedPullRequest, CachedRepository, PrKey, RepoKey, StateStore};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// What one sync pass accomplished
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Repositories successfully synced
    pub repositories: usize,
    /// Repositories skipped because their PR listing failed
    pub skipped_repositories: usize,
    /// Pull request snapshots written to the cache
    pub pull_requests: usize,
    /// Cached pull requests removed because they are no longer open
    pub removed_pull_requests: usize,
}

/// Pulls repository/PR listings from GitHub into the state store
pub struct SyncEngine {
    client: Arc<dyn GitHubClient>,
    store: Arc<dyn StateStore>,
    max_concurrency: usize,
    abort: Arc<AtomicBool>,
}

#[derive(Debug, Default)]
struct RepoOutcome {
    synced: bool,
    pull_requests: usize,
    removed: usize,
}

impl SyncEngine {
    pub fn new(
        client: Arc<dyn GitHubClient>,
        store: Arc<dyn StateStore>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            client,
            store,
            max_concurrency: max_concurrency.max(1),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the engine from scheduling further remote work
    ///
    /// In-flight repository syncs run to completion; only new work is
    /// suppressed once the flag is set.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Refresh the cached repository and pull request sets
    ///
    /// Fails only when the repository listing itself cannot be fetched or
    /// the cache cannot be read; everything below that is logged, counted
    /// in the report, and skipped.
    pub async fn sync(&self) -> Result<SyncReport> {
        let repos = self
            .client
            .list_repositories()
            .await
            .context("listing repositories")?;
        info!("Syncing {} repositories", repos.len());

        // Repositories gone from the listing take their PRs with them.
        let live: HashSet<RepoKey> = repos
            .iter()
            .map(|r| RepoKey::new(r.owner.clone(), r.name.clone()))
            .collect();
        for cached in self
            .store
            .list_repositories()
            .context("listing cached repositories")?
        {
            if !live.contains(&cached.key) {
                info!("Repository {} no longer visible, dropping it", cached.key);
                if let Err(e) = self.store.delete_repository(&cached.key) {
                    error!("Failed to drop repository {}: {}", cached.key, e);
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<RepoOutcome> = JoinSet::new();

        for repo in repos {
            if self.abort.load(Ordering::Relaxed) {
                warn!("Sync aborted, not scheduling remaining repositories");
                break;
            }
            let client = Arc::clone(&self.client);
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return RepoOutcome::default();
                };
                sync_repository(client.as_ref(), store.as_ref(), &repo).await
            });
        }

        let mut report = SyncReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    if outcome.synced {
                        report.repositories += 1;
                    } else {
                        report.skipped_repositories += 1;
                    }
                    report.pull_requests += outcome.pull_requests;
                    report.removed_pull_requests += outcome.removed;
                }
                Err(e) => {
                    error!("Repository sync task failed: {}", e);
                    report.skipped_repositories += 1;
                }
            }
        }

        info!(
            "Sync finished: {} repositories ({} skipped), {} PRs cached, {} removed",
            report.repositories,
            report.skipped_repositories,
            report.pull_requests,
            report.removed_pull_requests
        );
        Ok(report)
    }
}

/// Sync a single repository: listing, per-PR snapshots, reconciliation
async fn sync_repository(
    client: &dyn GitHubClient,
    store: &dyn StateStore,
    repo: &Repository,
) -> RepoOutcome {
    let key = RepoKey::new(repo.owner.clone(), repo.name.clone());

    if let Err(e) = store.upsert_repository(CachedRepository {
        key: key.clone(),
        default_branch: repo.default_branch.clone(),
        synced_at: Utc::now(),
    }) {
        error!("Failed to cache repository {}: {}", key, e);
        return RepoOutcome::default();
    }

    let listed = match client.list_open_pull_requests(&repo.owner, &repo.name).await {
        Ok(prs) => prs,
        Err(e) => {
            warn!("Skipping {}: failed to list open PRs: {}", key, e);
            return RepoOutcome::default();
        }
    };
    debug!("{}: {} open PRs listed", key, listed.len());

    let mut open_numbers: HashSet<u64> = listed.iter().map(|pr| pr.number).collect();
    let mut stored = 0;

    for pr in &listed {
        // The list endpoint leaves the mergeable flag unset; only the
        // detail fetch yields a snapshot worth caching.
        let snapshot = match client
            .fetch_pull_request(&repo.owner, &repo.name, pr.number)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Keeping previous snapshot of {}#{}: {}",
                    key, pr.number, e
                );
                continue;
            }
        };

        if snapshot.state != PrState::Open {
            // Closed between listing and fetch; reconcile it away below.
            open_numbers.remove(&pr.number);
            continue;
        }

        match store.upsert_pull_request(CachedPullRequest {
            key: PrKey::new(key.clone(), pr.number),
            snapshot,
            synced_at: Utc::now(),
        }) {
            Ok(()) => stored += 1,
            Err(e) => error!("Failed to cache {}#{}: {}", key, pr.number, e),
        }
    }

    // Cached PRs absent from the open listing were merged or closed
    // externally; drop them so reviews cannot act on them.
    let mut removed = 0;
    match store.list_pull_requests(&key) {
        Ok(cached) => {
            for entry in cached {
                if !open_numbers.contains(&entry.key.number) {
                    info!("{} is no longer open, dropping it", entry.key);
                    match store.delete_pull_request(&entry.key) {
                        Ok(()) => removed += 1,
                        Err(e) => error!("Failed to drop {}: {}", entry.key, e),
                    }
                }
            }
        }
        Err(e) => error!("Failed to list cached PRs for {}: {}", key, e),
    }

    RepoOutcome {
        synced: true,
        pull_requests: stored,
        removed,
    }
}
