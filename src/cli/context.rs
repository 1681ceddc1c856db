//! Shared setup for CLI commands

use anyhow::{Context, Result};
use automerge_bot::config::SharedConfig;
use automerge_bot::platform::{GitHubService, LoggingPlatform, PlatformService};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration and hosting connection used by the running bot
pub struct BotContext {
    /// Where the configuration was read from (reloads read it again)
    pub config_path: PathBuf,
    /// Live configuration
    pub config: Arc<SharedConfig>,
    /// Connection to the monitored repository
    pub platform: Arc<dyn PlatformService>,
}

impl BotContext {
    /// Load the configuration and connect to GitHub
    pub fn new(config_path: &Path) -> Result<Self> {
        let config = Arc::new(
            SharedConfig::load(config_path)
                .with_context(|| format!("loading {}", config_path.display()))?,
        );

        let snapshot = config.snapshot();
        let current = &snapshot.config;
        let token = current.auth_token().context(
            "no GitHub token: set auth_token in the config file, AUTOMERGE_BOT_TOKEN or GITHUB_TOKEN",
        )?;
        let github = GitHubService::new(
            &token,
            current.repository_owner.clone(),
            current.repository_name.clone(),
            None,
        )?;

        Ok(Self {
            config_path: config_path.to_path_buf(),
            config,
            platform: Arc::new(LoggingPlatform::new(github)),
        })
    }
}
