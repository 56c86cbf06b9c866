//! JSON-file-backed snapshot store
//!
//! Persists the whole snapshot to a single JSON file so cached state
//! survives across runs. Every mutation writes the file through a
//! temporary sibling and renames it into place, so a crash mid-write
//! leaves the previous snapshot intact.

use crate::{CachedPullRequest, CachedRepository, PrKey, RepoKey, Result, StateStore, StoreError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Snapshot store persisted to a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    repositories: HashMap<RepoKey, CachedRepository>,
    pull_requests: HashMap<PrKey, CachedPullRequest>,
}

/// On-disk layout: plain vectors, so keys stay readable JSON
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    repositories: Vec<CachedRepository>,
    pull_requests: Vec<CachedPullRequest>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing snapshot
    ///
    /// Missing file means an empty store; parent directories are created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let maps = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let snapshot: SnapshotFile = serde_json::from_str(&content)?;
            debug!(
                "Loaded snapshot from {} ({} repositories, {} PRs)",
                path.display(),
                snapshot.repositories.len(),
                snapshot.pull_requests.len()
            );
            Maps {
                repositories: snapshot
                    .repositories
                    .into_iter()
                    .map(|r| (r.key.clone(), r))
                    .collect(),
                pull_requests: snapshot
                    .pull_requests
                    .into_iter()
                    .map(|p| (p.key.clone(), p))
                    .collect(),
            }
        } else {
            Maps::default()
        };

        Ok(Self {
            path,
            inner: Mutex::new(maps),
        })
    }

    /// The file this store persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Maps>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, maps: &Maps) -> Result<()> {
        let mut snapshot = SnapshotFile {
            repositories: maps.repositories.values().cloned().collect(),
            pull_requests: maps.pull_requests.values().cloned().collect(),
        };
        snapshot.repositories.sort_by_key(|r| r.key.to_string());
        snapshot.pull_requests.sort_by_key(|p| p.key.to_string());

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn upsert_repository(&self, repo: CachedRepository) -> Result<()> {
        let mut maps = self.lock()?;
        maps.repositories.insert(repo.key.clone(), repo);
        self.persist(&maps)
    }

    fn list_repositories(&self) -> Result<Vec<CachedRepository>> {
        Ok(self.lock()?.repositories.values().cloned().collect())
    }

    fn delete_repository(&self, key: &RepoKey) -> Result<()> {
        let mut maps = self.lock()?;
        maps.repositories.remove(key);
        maps.pull_requests.retain(|pr_key, _| pr_key.repo != *key);
        self.persist(&maps)
    }

    fn upsert_pull_request(&self, pr: CachedPullRequest) -> Result<()> {
        let mut maps = self.lock()?;
        maps.pull_requests.insert(pr.key.clone(), pr);
        self.persist(&maps)
    }

    fn get_pull_request(&self, key: &PrKey) -> Result<Option<CachedPullRequest>> {
        Ok(self.lock()?.pull_requests.get(key).cloned())
    }

    fn list_pull_requests(&self, repo: &RepoKey) -> Result<Vec<CachedPullRequest>> {
        let mut prs: Vec<_> = self
            .lock()?
            .pull_requests
            .values()
            .filter(|pr| pr.key.repo == *repo)
            .cloned()
            .collect();
        prs.sort_by_key(|pr| pr.key.number);
        Ok(prs)
    }

    fn delete_pull_request(&self, key: &PrKey) -> Result<()> {
        let mut maps = self.lock()?;
        maps.pull_requests.remove(key);
        self.persist(&maps)
    }
}
