//! Merge-conflict rule
//!
//! Reads the mergeable flag from the cached snapshot. GitHub computes
//! mergeability lazily, so a PR whose flag has not been computed yet
//! fails conservatively until the next sync picks up the real value.

use super::{Rule, RuleOutcome};
use async_trait::async_trait;
use gh_client::GitHubClient;
use gh_state_cache::CachedPullRequest;

/// Passes when the PR merges cleanly into its base branch
pub struct NoConflictsRule;

#[async_trait]
impl Rule for NoConflictsRule {
    fn name(&self) -> &str {
        "no-conflicts"
    }

    async fn evaluate(&self, pr: &CachedPullRequest, _client: &dyn GitHubClient) -> RuleOutcome {
        match pr.snapshot.mergeable {
            Some(true) => RuleOutcome::pass("no merge conflicts"),
            Some(false) => RuleOutcome::fail("merge conflicts against base branch"),
            None => RuleOutcome::fail("mergeability not yet computed by GitHub"),
        }
    }
}
