//! Approval-count rule
//!
//! Approvals change between syncs, so this rule reads the current review
//! state live from the API rather than trusting the cache.

use super::{Rule, RuleOutcome};
use async_trait::async_trait;
use gh_client::GitHubClient;
use gh_state_cache::CachedPullRequest;

/// Passes when enough reviewers currently approve the PR
///
/// A standing changes-requested review blocks the PR regardless of how
/// many approvals it has.
pub struct ApprovalsRule {
    required: usize,
}

impl ApprovalsRule {
    pub fn new(required: usize) -> Self {
        Self { required }
    }
}

#[async_trait]
impl Rule for ApprovalsRule {
    fn name(&self) -> &str {
        "approvals"
    }

    async fn evaluate(&self, pr: &CachedPullRequest, client: &dyn GitHubClient) -> RuleOutcome {
        if self.required == 0 {
            return RuleOutcome::pass("no approvals required");
        }

        let status = match client
            .fetch_approvals(&pr.key.repo.owner, &pr.key.repo.name, pr.key.number)
            .await
        {
            Ok(status) => status,
            Err(e) => return RuleOutcome::fail(format!("could not fetch approvals: {}", e)),
        };

        if !status.changes_requested_by.is_empty() {
            return RuleOutcome::fail(format!(
                "changes requested by {}",
                status.changes_requested_by.join(", ")
            ));
        }

        let message = format!(
            "{} of {} required approvals",
            status.approvals(),
            self.required
        );
        if status.approvals() >= self.required {
            RuleOutcome::pass(message)
        } else {
            RuleOutcome::fail(message)
        }
    }
}
