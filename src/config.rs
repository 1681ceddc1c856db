//! Bot configuration
//!
//! Loaded from a TOML file. The parsed configuration and the merge direction
//! graph derived from it are published as snapshots through [`SharedConfig`],
//! so a reload never exposes a half-applied state to running handlers.

use crate::directions::{MergeDirectionGraph, MergeEdge};
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "automerge-bot.toml";

/// Environment variables consulted for the GitHub token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["AUTOMERGE_BOT_TOKEN", "GITHUB_TOKEN"];

const DEFAULT_BRANCH_PREFIX: &str = "AutomergeBot/";
const DEFAULT_PULL_REQUEST_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);
const DEFAULT_CHECK_FREQUENCY: Duration = Duration::from_secs(30 * 60);
const MIN_CHECK_FREQUENCY: Duration = Duration::from_secs(60);

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    /// Owner of the monitored repository
    pub repository_owner: String,
    /// Name of the monitored repository
    pub repository_name: String,
    /// GitHub token; falls back to [`TOKEN_ENV_VARS`]
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Webhook secret (verified upstream of the bot)
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// GitHub login the bot acts as
    pub bot_user_name: String,
    /// Prefix of every branch the bot creates
    #[serde(default = "default_branch_prefix")]
    pub created_branches_prefix: String,
    /// Merge directions as `"source -> destination"`
    #[serde(default)]
    pub merge_directions: Vec<String>,
    /// If non-empty, only pushes by these authors are propagated
    #[serde(default)]
    pub automerge_only_for_authors: Vec<String>,
    /// Stale pull request governor settings
    #[serde(default)]
    pub governor: GovernorConfig,
}

/// Settings for the stale pull request governor
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GovernorConfig {
    /// Age after which an open bot PR is stale (`[d.]hh:mm[:ss]`)
    #[serde(default)]
    pub pull_request_time_limit: Option<String>,
    /// Interval between governor checks (`[d.]hh:mm[:ss]`)
    #[serde(default)]
    pub check_frequency: Option<String>,
    /// Slack bot token
    #[serde(default)]
    pub slack_token: Option<String>,
    /// Slack channels the bot is allowed to post in
    #[serde(default)]
    pub slack_channels: Option<String>,
    /// Slack Web API root, when not `https://slack.com/api`
    #[serde(default)]
    pub slack_api_url: Option<String>,
}

impl GovernorConfig {
    /// Parsed time limit, 15 minutes when absent or invalid
    pub fn pull_request_time_limit(&self) -> Duration {
        self.pull_request_time_limit
            .as_deref()
            .and_then(parse_time_span)
            .unwrap_or(DEFAULT_PULL_REQUEST_TIME_LIMIT)
    }

    /// Parsed check frequency, 30 minutes when absent or invalid and never
    /// below one minute
    pub fn check_frequency(&self) -> Duration {
        self.check_frequency
            .as_deref()
            .and_then(parse_time_span)
            .map_or(DEFAULT_CHECK_FREQUENCY, |frequency| {
                frequency.max(MIN_CHECK_FREQUENCY)
            })
    }

    /// Whether both Slack settings are present
    pub fn slack_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.slack_token) && present(&self.slack_channels)
    }
}

impl BotConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Token from the file, or from the environment
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                TOKEN_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|t| !t.trim().is_empty()))
            })
    }

    /// Parsed merge directions
    pub fn merge_edges(&self) -> Result<Vec<MergeEdge>> {
        parse_merge_directions(&self.merge_directions)
    }

    /// Build and validate the merge direction graph
    pub fn merge_direction_graph(&self) -> Result<MergeDirectionGraph> {
        MergeDirectionGraph::new(self.merge_edges()?)
    }

    /// Whether the author allow-list is active
    pub fn author_filter_enabled(&self) -> bool {
        self.automerge_only_for_authors
            .iter()
            .any(|a| !a.trim().is_empty())
    }
}

/// Parse `"source -> destination"` entries.
pub fn parse_merge_directions<S: AsRef<str>>(entries: &[S]) -> Result<Vec<MergeEdge>> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            let (source, destination) = entry.split_once("->").ok_or_else(|| {
                Error::Config(format!("merge direction '{entry}' is not 'source -> destination'"))
            })?;
            let (source, destination) = (source.trim(), destination.trim());
            if source.is_empty() || destination.is_empty() || destination.contains("->") {
                return Err(Error::Config(format!(
                    "merge direction '{entry}' is not 'source -> destination'"
                )));
            }
            Ok(MergeEdge::new(source, destination))
        })
        .collect()
}

/// Parse a `[d.]hh:mm[:ss]` time span.
pub fn parse_time_span(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (days, clock) = match text.split_once('.') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, text),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, 0),
        [h, m, s] => (
            h.parse::<u64>().ok()?,
            m.parse::<u64>().ok()?,
            s.parse::<u64>().ok()?,
        ),
        _ => return None,
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let seconds = days
        .checked_mul(86_400)?
        .checked_add(hours * 3_600 + minutes * 60 + seconds)?;
    Some(Duration::from_secs(seconds))
}

/// A configuration together with the merge direction graph built from it
#[derive(Debug)]
pub struct ConfigSnapshot {
    /// Parsed configuration
    pub config: BotConfig,
    /// Validated merge directions of `config`
    pub directions: MergeDirectionGraph,
}

impl ConfigSnapshot {
    /// Validate `config` and build its merge direction graph
    pub fn new(config: BotConfig) -> Result<Self> {
        let directions = config.merge_direction_graph()?;
        Ok(Self { config, directions })
    }
}

/// Live configuration shared by every component
#[derive(Debug)]
pub struct SharedConfig {
    current: ArcSwap<ConfigSnapshot>,
}

impl SharedConfig {
    /// Validate `config` and wrap it for sharing
    pub fn new(config: BotConfig) -> Result<Self> {
        Ok(Self {
            current: ArcSwap::from_pointee(ConfigSnapshot::new(config)?),
        })
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(BotConfig::load(path)?)
    }

    /// Current configuration and merge directions, taken together
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Validate and publish a new configuration.
    ///
    /// Nothing changes if `config` is invalid.
    pub fn update(&self, config: BotConfig) -> Result<()> {
        self.current.store(Arc::new(ConfigSnapshot::new(config)?));
        Ok(())
    }

    /// Re-read `path` and publish it
    pub fn reload(&self, path: &Path) -> Result<()> {
        self.update(BotConfig::load(path)?)?;
        info!(path = %path.display(), "configuration reloaded");
        self.log_summary();
        Ok(())
    }

    /// Log what the bot is working with
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let cfg = &snapshot.config;
        info!(
            owner = %cfg.repository_owner,
            repo = %cfg.repository_name,
            "working with repository"
        );
        info!(merge_directions = %snapshot.directions, "using merge directions");
        if cfg.author_filter_enabled() {
            warn!(
                authors = ?cfg.automerge_only_for_authors,
                "automerging only pushes from listed authors"
            );
        }
    }
}
