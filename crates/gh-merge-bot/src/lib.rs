//! Autonomous pull request gatekeeper for GitHub
//!
//! The bot mirrors repository/PR state into a local cache, evaluates a
//! tree of named pass/fail rules against every open pull request, and
//! merges the ones whose rule tree passes. The last-computed results can
//! be served read-only over HTTP.
//!
//! # Architecture
//!
//! ```text
//! GitHub ──► SyncEngine ──► StateStore ──► ReviewEngine ──► merge / report
//!                                              │
//!                                              └──► dashboard (read-only)
//! ```
//!
//! [`sync::SyncEngine`] refreshes the cache, [`rules`] evaluates the
//! condition tree per PR, and [`review::ReviewEngine`] turns passing
//! trees into merge calls, at most once per (repository, PR, head SHA).

pub mod config;
pub mod dashboard;
pub mod report;
pub mod review;
pub mod rules;
pub mod sync;

pub use config::BotConfig;
pub use review::{MergeOutcome, Review, ReviewEngine};
pub use rules::{Condition, Rule, RuleNode, RuleOutcome};
pub use sync::{SyncEngine, SyncReport};
