//! Bot configuration
//!
//! Configuration loaded from a `.gh-merge-bot.toml` file, searched in the
//! current working directory first and then in the home directory. Every
//! field has a default, so a missing file yields a working configuration.
//! `GITHUB_TOKEN` is deliberately not part of this struct; the CLI reads
//! it from the environment and fails hard when it is absent.

use gh_client::MergeMethod;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

const CONFIG_FILE: &str = ".gh-merge-bot.toml";

/// Bot configuration loaded from .gh-merge-bot.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotConfig {
    /// How many standing approvals a PR needs before it may merge
    #[serde(default = "default_required_approvals")]
    pub required_approvals: usize,

    /// Labels that block a merge when present on a PR
    #[serde(default = "default_blocking_labels")]
    pub blocking_labels: Vec<String>,

    /// How passing PRs are merged (merge commit, squash, rebase)
    #[serde(default)]
    pub merge_method: MergeMethod,

    /// Whether a PR whose rule tree has no leaves may auto-merge.
    ///
    /// An empty tree passes vacuously; with this off (the default) such a
    /// pass is treated as "unconfigured" and never merged.
    #[serde(default)]
    pub merge_on_empty_rules: bool,

    /// Upper bound on concurrent per-repository/per-PR work
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-call timeout for remote API requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where the synchronized snapshot is persisted
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Dashboard port (the PORT environment variable overrides this)
    #[serde(default = "default_port")]
    pub port: u16,

    /// How often the dashboard recomputes reviews, in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_required_approvals() -> usize {
    1
}

fn default_blocking_labels() -> Vec<String> {
    vec!["do-not-merge".to_string()]
}

fn default_max_concurrency() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_file() -> String {
    env::var_os("HOME")
        .map(|home| {
            PathBuf::from(home)
                .join(".cache")
                .join("gh-merge-bot")
                .join("state.json")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "gh-merge-bot-state.json".to_string())
}

fn default_port() -> u16 {
    8080
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            required_approvals: default_required_approvals(),
            blocking_labels: default_blocking_labels(),
            merge_method: MergeMethod::default(),
            merge_on_empty_rules: false,
            max_concurrency: default_max_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_file: default_cache_file(),
            port: default_port(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl BotConfig {
    /// Load config from CWD first, then home directory, or use defaults
    ///
    /// A `PORT` environment variable overrides the configured dashboard
    /// port, matching the hosting platforms this bot gets deployed on.
    pub fn load() -> Self {
        let mut config = if let Some(content) = load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded bot config from file");
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                    Self::default()
                }
            }
        } else {
            log::debug!("Using default bot config");
            Self::default()
        };

        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring unparseable PORT value: {}", port),
            }
        }

        config
    }
}

/// Load config file content from CWD first, then home directory
fn load_config_file() -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
        log::debug!("Loaded config from {}", CONFIG_FILE);
        return Some(content);
    }

    if let Some(home_config) = get_home_config_path() {
        if let Ok(content) = std::fs::read_to_string(&home_config) {
            log::debug!("Loaded config from {}", home_config.display());
            return Some(content);
        }
    }

    None
}

/// Get the path to the config file in the home directory
fn get_home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}
