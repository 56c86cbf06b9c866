//! In-memory snapshot store
//!
//! Used by tests and one-shot runs where persistence across processes is
//! not needed.

use crate::{CachedPullRequest, CachedRepository, PrKey, RepoKey, Result, StateStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Snapshot store backed by in-process hash maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    repositories: HashMap<RepoKey, CachedRepository>,
    pull_requests: HashMap<PrKey, CachedPullRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Maps>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl StateStore for MemoryStore {
    fn upsert_repository(&self, repo: CachedRepository) -> Result<()> {
        self.lock()?.repositories.insert(repo.key.clone(), repo);
        Ok(())
    }

    fn list_repositories(&self) -> Result<Vec<CachedRepository>> {
        Ok(self.lock()?.repositories.values().cloned().collect())
    }

    fn delete_repository(&self, key: &RepoKey) -> Result<()> {
        let mut maps = self.lock()?;
        maps.repositories.remove(key);
        maps.pull_requests.retain(|pr_key, _| pr_key.repo != *key);
        Ok(())
    }

    fn upsert_pull_request(&self, pr: CachedPullRequest) -> Result<()> {
        self.lock()?.pull_requests.insert(pr.key.clone(), pr);
        Ok(())
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
        self.lock()?.pull_requests.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gh_client::{PrState, PullRequest};

    fn repo(owner: &str, name: &str) -> CachedRepository {
        CachedRepository {
            key: RepoKey::new(owner, name),
            default_branch: "main".to_string(),
            synced_at: Utc::now(),
        }
    }

    fn pr(owner: &str, name: &str, number: u64) -> CachedPullRequest {
        CachedPullRequest {
            key: PrKey::new(RepoKey::new(owner, name), number),
            snapshot: PullRequest {
                number,
                title: format!("PR {}", number),
                author: "alice".to_string(),
                head_sha: format!("sha-{}", number),
                base_branch: "main".to_string(),
                state: PrState::Open,
                mergeable: Some(true),
                requested_reviewers: vec![],
                labels: vec![],
                updated_at: Utc::now(),
                html_url: String::new(),
            },
            synced_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let store = MemoryStore::new();
        store.upsert_pull_request(pr("acme", "widgets", 42)).unwrap();

        let key = PrKey::new(RepoKey::new("acme", "widgets"), 42);
        let cached = store.get_pull_request(&key).unwrap().unwrap();
        assert_eq!(cached.snapshot.head_sha, "sha-42");
    }

    #[test]
    fn test_upsert_replaces() {
        let store = MemoryStore::new();
        store.upsert_pull_request(pr("acme", "widgets", 42)).unwrap();

        let mut updated = pr("acme", "widgets", 42);
        updated.snapshot.head_sha = "sha-new".to_string();
        store.upsert_pull_request(updated).unwrap();

        let key = PrKey::new(RepoKey::new("acme", "widgets"), 42);
        let cached = store.get_pull_request(&key).unwrap().unwrap();
        assert_eq!(cached.snapshot.head_sha, "sha-new");
        assert_eq!(store.list_pull_requests(&key.repo).unwrap().len(), 1);
    }

    #[test]
    fn test_list_is_scoped_to_repository() {
        let store = MemoryStore::new();
        store.upsert_pull_request(pr("acme", "widgets", 1)).unwrap();
        store.upsert_pull_request(pr("acme", "widgets", 2)).unwrap();
        store.upsert_pull_request(pr("acme", "gears", 3)).unwrap();

        let widgets = store
            .list_pull_requests(&RepoKey::new("acme", "widgets"))
            .unwrap();
        assert_eq!(widgets.len(), 2);
        assert!(widgets.iter().all(|p| p.key.repo.name == "widgets"));
    }

    #[test]
    fn test_delete_repository_removes_its_prs() {
        let store = MemoryStore::new();
        store.upsert_repository(repo("acme", "widgets")).unwrap();
        store.upsert_pull_request(pr("acme", "widgets", 1)).unwrap();
        store.upsert_pull_request(pr("acme", "gears", 2)).unwrap();

        store.delete_repository(&RepoKey::new("acme", "widgets")).unwrap();

        assert!(store.list_repositories().unwrap().is_empty());
        assert!(store
            .list_pull_requests(&RepoKey::new("acme", "widgets"))
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .list_pull_requests(&RepoKey::new("acme", "gears"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_delete_pull_request() {
        let store = MemoryStore::new();
        store.upsert_pull_request(pr("acme", "widgets", 42)).unwrap();

        let key = PrKey::new(RepoKey::new("acme", "widgets"), 42);
        store.delete_pull_request(&key).unwrap();
        assert!(store.get_pull_request(&key).unwrap().is_none());
    }
}
