//! CI status rule
//!
//! Status checks can finish (or start failing) between syncs, so this
//! rule reads the aggregated check state live for the PR's head commit.

use super::{Rule, RuleOutcome};
use async_trait::async_trait;
use gh_client::{CiState, GitHubClient};
use gh_state_cache::CachedPullRequest;

/// Passes when every status check on the head commit is green
///
/// A repository without any configured checks passes; pending checks
/// fail until they finish.
pub struct CiChecksRule;

#[async_trait]
impl Rule for CiChecksRule {
    fn name(&self) -> &str {
        "ci-checks"
    }

    async fn evaluate(&self, pr: &CachedPullRequest, client: &dyn GitHubClient) -> RuleOutcome {
        let ci = match client
            .fetch_ci_status(
                &pr.key.repo.owner,
                &pr.key.repo.name,
                &pr.snapshot.head_sha,
            )
            .await
        {
            Ok(ci) => ci,
            Err(e) => return RuleOutcome::fail(format!("could not fetch CI status: {}", e)),
        };

        match ci.state {
            CiState::Success => RuleOutcome::pass(format!("{} checks green", ci.passed)),
            CiState::Unknown => RuleOutcome::pass("no status checks configured"),
            CiState::Pending => RuleOutcome::fail(format!(
                "{} of {} checks still running",
                ci.pending, ci.total_checks
            )),
            CiState::Failure => RuleOutcome::fail(format!(
                "{} of {} checks failing",
                ci.failed, ci.total_checks
            )),
        }
    }
}
