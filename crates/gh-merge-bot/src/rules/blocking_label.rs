//! Blocking-label rule
//!
//! Labels come from the synchronized snapshot; a "do-not-merge" style
//! label anywhere on the PR vetoes the merge.

use super::{Rule, RuleOutcome};
use async_trait::async_trait;
use gh_client::GitHubClient;
use gh_state_cache::CachedPullRequest;

/// Fails when any configured blocking label is present on the PR
pub struct BlockingLabelRule {
    labels: Vec<String>,
}

impl BlockingLabelRule {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl Rule for BlockingLabelRule {
    fn name(&self) -> &str {
        "labels"
    }

    async fn evaluate(&self, pr: &CachedPullRequest, _client: &dyn GitHubClient) -> RuleOutcome {
        let blocking = pr.snapshot.labels.iter().find(|label| {
            self.labels
                .iter()
                .any(|blocked| blocked.eq_ignore_ascii_case(label))
        });

        match blocking {
            Some(label) => RuleOutcome::fail(format!("blocked by label '{}'", label)),
            None => RuleOutcome::pass("no blocking labels"),
        }
    }
}
