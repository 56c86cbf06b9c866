//! Terminal rendering of review results
//!
//! Depth-first walk over the condition tree: one line per condition,
//! one tab per depth level, message colored green/red by verdict.

use crate::review::{MergeOutcome, Review};
use crate::rules::Condition;
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Render reviews for the `status` subcommand
pub fn render_reviews(reviews: &[Review]) -> String {
    let mut out = String::new();
    for review in reviews {
        let _ = writeln!(
            out,
            "{}#{} - {}",
            review.repository, review.pull_request_number, review.pull_request_title
        );
        render_condition(&review.condition, 1, &mut out);
    }
    out
}

/// Render merge outcomes for the `review` subcommand
pub fn render_merge_outcomes(reviews: &[Review]) -> String {
    let mut out = String::new();
    for review in reviews {
        let line = match &review.merge {
            MergeOutcome::Merged { sha } => format!(
                "{}#{}: merged at {}",
                review.repository, review.pull_request_number, sha
            )
            .green()
            .to_string(),
            MergeOutcome::Failed { reason } => format!(
                "{}#{}: merge failed: {}",
                review.repository, review.pull_request_number, reason
            )
            .red()
            .to_string(),
            MergeOutcome::NotAttempted => format!(
                "{}#{}: not merged ({})",
                review.repository, review.pull_request_number, review.condition.message
            ),
        };
        let _ = writeln!(out, "{}", line);
    }
    out
}

fn render_condition(condition: &Condition, depth: usize, out: &mut String) {
    let verdict = if condition.passed {
        condition.message.green().to_string()
    } else {
        condition.message.red().to_string()
    };
    let _ = writeln!(
        out,
        "{}{}:\t{}",
        "\t".repeat(depth),
        condition.name,
        verdict
    );
    for sub in &condition.subconditions {
        render_condition(sub, depth + 1, out);
    }
}
