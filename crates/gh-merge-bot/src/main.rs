//! CLI shell for the merge bot
//!
//! Thin dispatch over the engines: `sync` refreshes the cache, `review`
//! evaluates and merges, `status` evaluates and prints the rule tree,
//! `serve` exposes the last-computed reviews over HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gh_merge_bot::config::BotConfig;
use gh_merge_bot::{dashboard, report, ReviewEngine, SyncEngine};
use gh_client::{GitHubClient, OctocrabClient, RetryPolicy, RetryingClient};
use gh_state_cache::{JsonFileStore, StateStore};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(
    name = "gh-merge-bot",
    about = "Autonomous pull request gatekeeper for GitHub",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronize cached repository/PR state with GitHub
    Sync,
    /// Evaluate open pull requests and merge the ones that pass
    Review,
    /// Evaluate open pull requests and print the rule tree per PR
    Status,
    /// Serve the last-computed reviews over HTTP
    Serve {
        /// Port to bind, overriding config and the PORT variable
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = BotConfig::load();

    let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN must be set")?;
    let octocrab = gh_client::octocrab::Octocrab::builder()
        .personal_token(token)
        .build()
        .context("building GitHub client")?;
    let policy = RetryPolicy {
        timeout: Duration::from_secs(config.request_timeout_secs),
        ..RetryPolicy::default()
    };
    let client: Arc<dyn GitHubClient> = Arc::new(RetryingClient::new(
        OctocrabClient::new(Arc::new(octocrab)),
        policy,
    ));
    let store: Arc<dyn StateStore> = Arc::new(
        JsonFileStore::open(&config.cache_file).context("opening state cache")?,
    );

    match cli.command {
        Command::Sync => {
            let engine = SyncEngine::new(
                Arc::clone(&client),
                Arc::clone(&store),
                config.max_concurrency,
            );
            abort_on_ctrl_c(engine.abort_flag());
            let report = engine.sync().await?;
            println!(
                "Synced {} repositories ({} skipped), {} open PRs cached, {} removed",
                report.repositories,
                report.skipped_repositories,
                report.pull_requests,
                report.removed_pull_requests
            );
        }
        Command::Review => {
            let engine = ReviewEngine::new(Arc::clone(&client), Arc::clone(&store), &config);
            abort_on_ctrl_c(engine.abort_flag());
            let reviews = engine.review_all(true).await?;
            print!("{}", report::render_merge_outcomes(&reviews));
        }
        Command::Status => {
            let engine = ReviewEngine::new(Arc::clone(&client), Arc::clone(&store), &config);
            abort_on_ctrl_c(engine.abort_flag());
            let reviews = engine.review_all(false).await?;
            print!("{}", report::render_reviews(&reviews));
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.port);
            serve(client, store, config, port).await?;
        }
    }

    Ok(())
}

/// Compute an initial review set, keep it fresh in the background, and
/// serve it read-only until shutdown
async fn serve(
    client: Arc<dyn GitHubClient>,
    store: Arc<dyn StateStore>,
    config: BotConfig,
    port: u16,
) -> Result<()> {
    let shared: dashboard::SharedReviews = Arc::new(RwLock::new(Vec::new()));

    let refresh_shared = Arc::clone(&shared);
    let interval = Duration::from_secs(config.refresh_interval_secs.max(1));
    tokio::spawn(async move {
        let sync_engine = SyncEngine::new(
            Arc::clone(&client),
            Arc::clone(&store),
            config.max_concurrency,
        );
        let review_engine = ReviewEngine::new(client, Arc::clone(&store), &config);

        let mut ticker = tokio::time::interval(interval);
        loop {
            // The first tick fires immediately, so the dashboard has data
            // as soon as the initial sync finishes.
            ticker.tick().await;
            match refresh(&sync_engine, &review_engine).await {
                Ok(reviews) => {
                    info!("Dashboard refreshed with {} reviews", reviews.len());
                    *refresh_shared.write().await = reviews;
                }
                Err(e) => {
                    // Keep serving the previous review set.
                    error!("Dashboard refresh failed: {:#}", e);
                }
            }
        }
    });

    dashboard::serve(shared, port).await
}

async fn refresh(
    sync_engine: &SyncEngine,
    review_engine: &ReviewEngine,
) -> Result<Vec<gh_merge_bot::Review>> {
    sync_engine.sync().await.context("sync pass")?;
    review_engine
        .review_all(false)
        .await
        .context("review pass")
}

/// Stop scheduling new remote work once ctrl-c arrives; in-flight calls
/// finish and the next sync pass reconciles anything ambiguous
fn abort_on_ctrl_c(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown requested, finishing in-flight work");
            flag.store(true, Ordering::Relaxed);
        }
    });
}
