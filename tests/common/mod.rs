//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::*;

use automerge_bot::automerge::PushHandler;
use automerge_bot::config::{BotConfig, GovernorConfig, SharedConfig};
use automerge_bot::platform::PlatformService;
use automerge_bot::types::{Account, CommitAuthor, PullRequest, PushEvent};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const REPO_ID: u64 = 4242;
pub const BOT: &str = "automerge-bot";
pub const PREFIX: &str = "AutomergeBot/";

/// Configuration for acme/widgets with the given merge directions
pub fn bot_config(directions: &[&str]) -> BotConfig {
    BotConfig {
        repository_owner: "acme".to_string(),
        repository_name: "widgets".to_string(),
        auth_token: None,
        webhook_secret: None,
        bot_user_name: BOT.to_string(),
        created_branches_prefix: PREFIX.to_string(),
        merge_directions: directions.iter().map(ToString::to_string).collect(),
        automerge_only_for_authors: Vec::new(),
        governor: GovernorConfig::default(),
    }
}

pub fn shared_config(config: BotConfig) -> Arc<SharedConfig> {
    Arc::new(SharedConfig::new(config).unwrap())
}

pub fn mock_platform() -> Arc<MockPlatformService> {
    Arc::new(MockPlatformService::new(REPO_ID, BOT))
}

/// Handler wired to `mock`
pub fn push_handler(config: BotConfig, mock: &Arc<MockPlatformService>) -> PushHandler {
    let platform: Arc<dyn PlatformService> = mock.clone();
    PushHandler::new(shared_config(config), platform)
}

/// A regular push of `sha` to `branch` by `author`
pub fn make_push(branch: &str, sha: &str, author: &str) -> PushEvent {
    PushEvent {
        repository_id: REPO_ID,
        git_ref: format!("refs/heads/{branch}"),
        head_commit_sha: sha.to_string(),
        created: false,
        forced: false,
        deleted: false,
        head_commit_author: CommitAuthor {
            user_name: author.to_string(),
            email: format!("{author}@example.com"),
        },
        commit_shas: vec![sha.to_string()],
    }
}

pub fn make_account(login: &str, id: u64, email: Option<&str>) -> Account {
    Account {
        login: login.to_string(),
        id,
        email: email.map(ToString::to_string),
    }
}

/// An open pull request opened by the bot from a temporary branch
pub fn make_bot_pr(number: u64, base: &str, created_at: DateTime<Utc>) -> PullRequest {
    PullRequest {
        number,
        title: format!("Automerge develop @abc1234{number} -> {base}"),
        html_url: format!("https://github.com/acme/widgets/pull/{number}"),
        author: BOT.to_string(),
        base_ref: base.to_string(),
        head_ref: format!("{PREFIX}develop_abc1234{number}_to_{base}"),
        created_at,
        assignees: Vec::new(),
    }
}
