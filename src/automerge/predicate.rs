//! Decides whether a push is processed at all
//!
//! Checks run in a fixed order and stop at the first rejection, each logging
//! its own reason.

use crate::config::BotConfig;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::PushEvent;
use tracing::{debug, warn};

/// Push must add commits to a branch: no deletion, no force-push, no tag.
pub fn adds_new_commits(push: &PushEvent) -> bool {
    if !push.deleted && !push.forced && push.is_branch_push() {
        return true;
    }
    debug!(
        git_ref = %push.git_ref,
        deleted = push.deleted,
        forced = push.forced,
        "push does not add new commits, perhaps it is a force push or tag push"
    );
    false
}

/// Push landed on a branch created by the bot itself
pub fn is_bot_branch(push: &PushEvent, config: &BotConfig) -> bool {
    let is_ours = push
        .pushed_branch()
        .is_ok_and(|b| b.has_prefix(&config.created_branches_prefix));
    if is_ours {
        debug!(git_ref = %push.git_ref, "push is on a branch created by the bot");
    }
    is_ours
}

/// Head commit author is the bot or on the allow-list (if one is configured)
pub fn is_author_allowed(push: &PushEvent, config: &BotConfig) -> bool {
    if !config.author_filter_enabled() {
        return true;
    }

    let author = push.head_commit_author.user_name.trim();
    if author == config.bot_user_name {
        return true;
    }

    let allowed = config
        .automerge_only_for_authors
        .iter()
        .any(|a| a.trim() == author);
    if !allowed {
        warn!(author, "automerging is not enabled for commit author");
    }
    allowed
}

/// Full acceptance check for a push.
///
/// The repository identity check needs the platform; an error there is
/// returned to the caller, which treats it as a rejection.
pub async fn can_process_push(
    push: &PushEvent,
    config: &BotConfig,
    platform: &dyn PlatformService,
) -> Result<bool> {
    let monitored_id = platform.repository_id().await?;
    if monitored_id != push.repository_id {
        debug!(
            pushed = push.repository_id,
            monitored = monitored_id,
            owner = %config.repository_owner,
            repo = %config.repository_name,
            "push is not from the monitored repository"
        );
        return Ok(false);
    }

    Ok(adds_new_commits(push) && !is_bot_branch(push, config) && is_author_allowed(push, config))
}
