//! Merging a pushed commit into one destination branch
//!
//! Every attempt goes through a temporary branch and a pull request so that
//! a conflict leaves something a human can pick up.

use crate::automerge::handoff;
use crate::automerge::{PULL_REQUEST_TITLE_PREFIX, SUCCESSFUL_MERGE_COMMENT};
use crate::config::BotConfig;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{BranchName, MergeOutcome, PullRequest, PushEvent, short_sha};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

static CO_AUTHOR_TRAILER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?im)^co-authored-by:[ \t]*(.+)$").ok());

static CO_AUTHOR_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^co-authored-by:[ \t]*([\w.\-]+)").ok());

/// What happened to a single merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Merged; the temporary branch was removed
    Merged {
        /// Pull request used for the merge
        pr_number: u64,
    },
    /// Conflicting; the pull request was handed over to a person
    HandedOff {
        /// Pull request left open
        pr_number: u64,
        /// Login the pull request was handed to
        user: String,
    },
    /// GitHub refused to open the pull request (typically nothing to merge);
    /// the temporary branch was removed
    PullRequestNotCreated,
}

/// Name of the temporary branch carrying `sha` from `source` to `destination`
pub fn temp_branch_name(
    prefix: &str,
    source: &BranchName,
    sha: &str,
    destination: &BranchName,
) -> BranchName {
    let body = format!("{source}_{}_to_{destination}", short_sha(sha));
    BranchName::new(format!("{prefix}{}", BranchName::sanitize(&body)))
}

/// Title of the pull request opened for an attempt
pub fn pull_request_title(source: &BranchName, sha: &str, destination: &BranchName) -> String {
    format!(
        "{PULL_REQUEST_TITLE_PREFIX} {source} @{} -> {destination}",
        short_sha(sha)
    )
}

/// Extract the first `Co-authored-by:` trailer line of a commit message
pub fn find_co_author_trailer(message: &str) -> Option<String> {
    CO_AUTHOR_TRAILER
        .as_ref()?
        .captures(message)
        .and_then(|c| c.get(0))
        .map(|m| m.as_str().trim_end().to_string())
}

/// Login named by a `Co-authored-by:` trailer
pub fn co_author_name(trailer: &str) -> Option<String> {
    CO_AUTHOR_NAME
        .as_ref()?
        .captures(trailer)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Person credited for a push, together with the trailer crediting them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    /// Login that receives the hand-off if the merge conflicts
    pub user: String,
    /// `Co-authored-by:` trailer placed in the merge commit message
    pub trailer: String,
}

fn pusher_credit(push: &PushEvent) -> Credit {
    let author = &push.head_commit_author;
    Credit {
        user: author.user_name.clone(),
        trailer: format!("Co-authored-by: {} <{}>", author.user_name, author.email),
    }
}

/// Find out who should be credited for a push.
///
/// A push made by the bot itself is a propagation of an earlier merge,
/// whose commit message names the original author in a trailer.
pub async fn resolve_credit(
    push: &PushEvent,
    config: &BotConfig,
    platform: &dyn PlatformService,
) -> Credit {
    if push.head_commit_author.user_name != config.bot_user_name {
        return pusher_credit(push);
    }

    let message = match platform.get_commit(&push.head_commit_sha).await {
        Ok(commit) => commit.message,
        Err(e) => {
            warn!(sha = %push.head_commit_sha, error = %e, "could not read head commit message");
            return pusher_credit(push);
        }
    };

    let trailer = find_co_author_trailer(&message);
    match trailer.as_deref().and_then(co_author_name) {
        Some(user) => Credit {
            user,
            trailer: trailer.unwrap_or_default(),
        },
        None => {
            warn!(
                sha = %push.head_commit_sha,
                "bot commit has no usable Co-authored-by trailer, crediting the bot"
            );
            pusher_credit(push)
        }
    }
}

/// Carry the pushed head commit from `source` into `destination`.
///
/// Returns an error only when the attempt could not get going (the
/// temporary branch could not be created) or the merge call itself
/// failed; a refused pull request or a conflict are regular outcomes.
pub async fn merge_pushed_changes(
    push: &PushEvent,
    source: &BranchName,
    destination: &BranchName,
    config: &BotConfig,
    platform: &dyn PlatformService,
) -> Result<AttemptOutcome> {
    let sha = &push.head_commit_sha;
    let temp = temp_branch_name(&config.created_branches_prefix, source, sha, destination);

    info!(%source, %destination, temp_branch = %temp, "merging pushed changes");
    platform.create_branch(&temp, sha).await?;

    let credit = resolve_credit(push, config, platform).await;
    let title = pull_request_title(source, sha, destination);
    let body = format!("Last change author: {}", credit.user);

    let pr = match platform.create_pr(&temp, destination, &title, &body).await {
        Ok(pr) => pr,
        Err(e) => {
            info!(
                temp_branch = %temp,
                error = %e,
                "pull request not created, perhaps there is nothing to merge"
            );
            remove_temp_branch(&temp, platform).await;
            return Ok(AttemptOutcome::PullRequestNotCreated);
        }
    };

    let message = format!("{title}\n\n{}", credit.trailer);
    match platform.merge_pr(pr.number, &message).await? {
        MergeOutcome::Merged { sha: merge_sha } => {
            info!(pr = pr.number, merge_sha = ?merge_sha, "pull request merged");
            remove_temp_branch(&temp, platform).await;
            Ok(AttemptOutcome::Merged {
                pr_number: pr.number,
            })
        }
        MergeOutcome::Conflict { message } => {
            info!(pr = pr.number, reason = %message, "pull request cannot be merged automatically");
            if let Err(e) = handoff::notify_unresolved_conflicts(
                platform,
                &pr,
                &credit.user,
                &temp,
                destination,
            )
            .await
            {
                warn!(pr = pr.number, error = %e, "conflict hand-off was incomplete");
            }
            Ok(AttemptOutcome::HandedOff {
                pr_number: pr.number,
                user: credit.user,
            })
        }
    }
}

/// Try once more to merge a pull request the bot opened earlier.
///
/// Returns whether the merge happened. A conflict is not an error.
pub async fn merge_existing_pr(pr: &PullRequest, platform: &dyn PlatformService) -> Result<bool> {
    let trailers: Vec<String> = pr
        .assignees
        .iter()
        .map(|a| format!("Co-authored-by: {} <{}>", a.login, a.co_author_email()))
        .collect();
    let message = format!("{}\n\n{}", pr.title, trailers.join("\n"));

    match platform.merge_pr(pr.number, &message).await? {
        MergeOutcome::Merged { .. } => {
            info!(pr = pr.number, "pending pull request merged");
            if let Err(e) = platform
                .create_pr_comment(pr.number, SUCCESSFUL_MERGE_COMMENT)
                .await
            {
                warn!(pr = pr.number, error = %e, "could not comment on merged pull request");
            }
            Ok(true)
        }
        MergeOutcome::Conflict { message } => {
            debug!(pr = pr.number, reason = %message, "pending pull request still not mergeable");
            Ok(false)
        }
    }
}

async fn remove_temp_branch(temp: &BranchName, platform: &dyn PlatformService) {
    if let Err(e) = platform.delete_branch(temp).await {
        error!(
            temp_branch = %temp,
            error = %e,
            "temporary branch could not be deleted and must be removed manually"
        );
    }
}
