//! Offline commands that only read the configuration

use anyhow::{Context, Result};
use automerge_bot::config::SharedConfig;
use std::path::Path;

fn load(config_path: &Path) -> Result<SharedConfig> {
    SharedConfig::load(config_path).with_context(|| format!("loading {}", config_path.display()))
}

/// Print the merge directions as a DOT graph
pub fn run_graph(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    print!("{}", config.snapshot().directions.to_dot());
    Ok(())
}

/// Validate the configuration and print a summary
pub fn run_check_config(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let snapshot = config.snapshot();
    let (current, directions) = (&snapshot.config, &snapshot.directions);

    println!(
        "repository: {}/{}",
        current.repository_owner, current.repository_name
    );
    println!("bot user: {}", current.bot_user_name);
    println!("branch prefix: {}", current.created_branches_prefix);
    println!("merge directions ({}): {directions}", directions.len());
    if current.author_filter_enabled() {
        println!(
            "automerge only for: {}",
            current.automerge_only_for_authors.join(", ")
        );
    }
    println!(
        "governor: time limit {}s, check every {}s, slack {}",
        current.governor.pull_request_time_limit().as_secs(),
        current.governor.check_frequency().as_secs(),
        if current.governor.slack_configured() {
            "enabled"
        } else {
            "disabled"
        }
    );
    if current.auth_token().is_none() {
        println!("warning: no GitHub token configured");
    }
    Ok(())
}
