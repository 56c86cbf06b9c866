//! Rule tree evaluation
//!
//! A PR's mergeability is decided by a tree of named checks. Leaves
//! compute pass/fail straight from the cached snapshot (or a live API
//! read); interior nodes AND their children together. Evaluation always
//! produces a [`Condition`] tree mirroring the rule tree: rules never
//! abort evaluation, a broken live check just yields a failing condition
//! with a diagnostic message.

mod approvals;
mod blocking_label;
mod ci_checks;
mod no_conflicts;

pub use approvals::ApprovalsRule;
pub use blocking_label::BlockingLabelRule;
pub use ci_checks::CiChecksRule;
pub use no_conflicts::NoConflictsRule;

use crate::config::BotConfig;
use async_trait::async_trait;
use gh_client::GitHubClient;
use gh_state_cache::CachedPullRequest;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// What a single rule decided, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub message: String,
}

impl RuleOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// A single mergeability check
///
/// Rules are infallible by contract: a rule whose live data fetch breaks
/// reports a failing outcome describing the breakage instead of erroring,
/// so one flaky check cannot take down evaluation of the rest of the
/// tree or of other PRs.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Stable name shown in reports and the dashboard
    fn name(&self) -> &str;

    /// Decide pass/fail for one pull request
    async fn evaluate(&self, pr: &CachedPullRequest, client: &dyn GitHubClient) -> RuleOutcome;
}

/// A node in the rule tree: either a leaf rule or an AND over children
pub enum RuleNode {
    /// A single check
    Leaf(Box<dyn Rule>),
    /// Passes only if every child passes; an empty group passes vacuously
    All {
        name: String,
        children: Vec<RuleNode>,
    },
}

impl RuleNode {
    /// Convenience constructor for an AND group
    pub fn all(name: impl Into<String>, children: Vec<RuleNode>) -> Self {
        RuleNode::All {
            name: name.into(),
            children,
        }
    }

    /// Convenience constructor for a leaf
    pub fn leaf(rule: impl Rule + 'static) -> Self {
        RuleNode::Leaf(Box::new(rule))
    }

    /// Number of leaf rules in this subtree
    ///
    /// Callers deciding whether a vacuous pass may merge must look at
    /// this, not at `Condition::passed` alone.
    pub fn leaf_count(&self) -> usize {
        match self {
            RuleNode::Leaf(_) => 1,
            RuleNode::All { children, .. } => children.iter().map(RuleNode::leaf_count).sum(),
        }
    }

    /// Evaluate this subtree against one pull request
    ///
    /// Children are evaluated in order; the returned condition tree has
    /// the same shape as the rule tree.
    pub fn evaluate<'a>(
        &'a self,
        pr: &'a CachedPullRequest,
        client: &'a dyn GitHubClient,
    ) -> Pin<Box<dyn Future<Output = Condition> + Send + 'a>> {
        Box::pin(async move {
            match self {
                RuleNode::Leaf(rule) => {
                    let outcome = rule.evaluate(pr, client).await;
                    Condition {
                        name: rule.name().to_string(),
                        message: outcome.message,
                        passed: outcome.passed,
                        subconditions: Vec::new(),
                    }
                }
                RuleNode::All { name, children } => {
                    let mut subconditions = Vec::with_capacity(children.len());
                    for child in children {
                        subconditions.push(child.evaluate(pr, client).await);
                    }

                    let failing: Vec<&str> = subconditions
                        .iter()
                        .filter(|c| !c.passed)
                        .map(|c| c.name.as_str())
                        .collect();
                    let passed = failing.is_empty();
                    let message = if subconditions.is_empty() {
                        "no rules configured".to_string()
                    } else if passed {
                        "all checks passed".to_string()
                    } else {
                        format!("failing: {}", failing.join(", "))
                    };

                    Condition {
                        name: name.clone(),
                        message,
                        passed,
                        subconditions,
                    }
                }
            }
        })
    }
}

/// Result of evaluating one rule-tree node
///
/// Conditions are ephemeral: recomputed on every evaluation pass, never
/// persisted, and serialized as-is for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub message: String,
    pub passed: bool,
    pub subconditions: Vec<Condition>,
}

/// The standard rule tree: conflicts, approvals, CI, blocking labels
pub fn default_rule_tree(config: &BotConfig) -> RuleNode {
    RuleNode::all(
        "ready-to-merge",
        vec![
            RuleNode::leaf(NoConflictsRule),
            RuleNode::leaf(ApprovalsRule::new(config.required_approvals)),
            RuleNode::leaf(CiChecksRule),
            RuleNode::leaf(BlockingLabelRule::new(config.blocking_labels.clone())),
        ],
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use gh_client::{
        ApprovalStatus, CiStatus, ClientError, MergeMethod, MergeResult, PullRequest, Repository,
    };

    /// Client with canned CI/approval responses; everything else errors
    ///
    /// With the default (`None`) responses every live call fails, which
    /// suits rules that must not touch the network and tests of the
    /// failure-downgrade path alike.
    #[derive(Default)]
    pub struct StubClient {
        pub ci: Option<CiStatus>,
        pub approvals: Option<ApprovalStatus>,
    }

    impl StubClient {
        pub fn none() -> Self {
            Self::default()
        }

        pub fn with_ci(ci: CiStatus) -> Self {
            Self {
                ci: Some(ci),
                ..Self::default()
            }
        }

        pub fn with_approvals(approvals: ApprovalStatus) -> Self {
            Self {
                approvals: Some(approvals),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl GitHubClient for StubClient {
        async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError> {
            Err(ClientError::Api("no network in this test".into()))
        }

        async fn list_open_pull_requests(
            &self,
            _owner: &str,
            _repo: &str,
        ) -> Result<Vec<PullRequest>, ClientError> {
            Err(ClientError::Api("no network in this test".into()))
        }

        async fn fetch_pull_request(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<PullRequest, ClientError> {
            Err(ClientError::Api("no network in this test".into()))
        }

        async fn fetch_ci_status(
            &self,
            _owner: &str,
            _repo: &str,
            _head_sha: &str,
        ) -> Result<CiStatus, ClientError> {
            self.ci
                .clone()
                .ok_or_else(|| ClientError::Api("no network in this test".into()))
        }

        async fn fetch_approvals(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<ApprovalStatus, ClientError> {
            self.approvals
                .clone()
                .ok_or_else(|| ClientError::Api("no network in this test".into()))
        }

        async fn merge_pull_request(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
            _expected_head_sha: &str,
            _method: MergeMethod,
        ) -> Result<MergeResult, ClientError> {
            Err(ClientError::Api("no network in this test".into()))
        }
    }

    pub fn sample_pr() -> CachedPullRequest {
        use gh_state_cache::{PrKey, RepoKey};
        CachedPullRequest {
            key: PrKey::new(RepoKey::new("acme", "widgets"), 42),
            snapshot: PullRequest {
                number: 42,
                title: "Add feature".to_string(),
                author: "alice".to_string(),
                head_sha: "abc123".to_string(),
                base_branch: "main".to_string(),
                state: gh_client::PrState::Open,
                mergeable: Some(true),
                requested_reviewers: vec![],
                labels: vec![],
                updated_at: chrono::Utc::now(),
                html_url: String::new(),
            },
            synced_at: chrono::Utc::now(),
        }
    }

    /// Rule with a fixed verdict, for shaping trees in tests
    pub struct StaticRule {
        pub verdict: bool,
    }

    #[async_trait]
    impl Rule for StaticRule {
        fn name(&self) -> &str {
            if self.verdict {
                "static-pass"
            } else {
                "static-fail"
            }
        }

        async fn evaluate(
            &self,
            _pr: &CachedPullRequest,
            _client: &dyn GitHubClient,
        ) -> RuleOutcome {
            if self.verdict {
                RuleOutcome::pass("ok")
            } else {
                RuleOutcome::fail("nope")
            }
        }
    }
}
