//! Removal of temporary branches that are no longer needed
//!
//! Two triggers: a push onto a merge destination that brought a temporary
//! branch's commits in, and a pull request on a temporary branch being
//! closed by merging it.

use crate::config::BotConfig;
use crate::directions::MergeDirectionGraph;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{Branch, BranchName, PullRequestEvent, PushEvent};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Temporary branches whose tip is one of `tips`
fn prefixed_branches_at<'a>(
    branches: &[Branch],
    tips: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> BTreeSet<BranchName> {
    let tips: BTreeSet<&str> = tips.into_iter().collect();
    branches
        .iter()
        .filter(|b| b.name.starts_with(prefix) && tips.contains(b.sha.as_str()))
        .map(|b| BranchName::new(b.name.as_str()))
        .collect()
}

/// Temporary branches made redundant by `push`.
///
/// `merged_parent` is the second parent of the pushed head commit when that
/// commit is a merge. Any temporary branch pointing at it, or at one of the
/// pushed commits, is redundant.
pub fn redundant_branches(
    push: &PushEvent,
    merged_parent: Option<&str>,
    branches: &[Branch],
    prefix: &str,
) -> BTreeSet<BranchName> {
    let mut redundant = prefixed_branches_at(branches, merged_parent, prefix);
    redundant.extend(prefixed_branches_at(
        branches,
        push.commit_shas.iter().map(String::as_str),
        prefix,
    ));
    redundant
}

/// Delete temporary branches merged in by `push`.
///
/// Does nothing unless the push landed on a configured merge destination.
/// Returns the branches that were deleted.
pub async fn collect_merged_temp_branches(
    push: &PushEvent,
    config: &BotConfig,
    directions: &MergeDirectionGraph,
    platform: &dyn PlatformService,
) -> Result<Vec<BranchName>> {
    let pushed = push.pushed_branch()?;
    if !directions.is_destination(&pushed) {
        debug!(branch = %pushed, "push is not on a merge destination, skipping cleanup");
        return Ok(Vec::new());
    }

    // The merge-parent signal is optional; the pushed commits still count
    let head = match platform.get_commit(&push.head_commit_sha).await {
        Ok(commit) => Some(commit),
        Err(e) => {
            warn!(sha = %push.head_commit_sha, error = %e, "could not read pushed head commit, using pushed commits only");
            None
        }
    };
    let merged_parent = head
        .as_ref()
        .and_then(|commit| commit.parent_shas.get(1))
        .map(String::as_str);
    let branches = platform.list_branches().await?;

    let redundant = redundant_branches(
        push,
        merged_parent,
        &branches,
        &config.created_branches_prefix,
    );

    let mut deleted = Vec::with_capacity(redundant.len());
    for branch in redundant {
        match platform.delete_branch(&branch).await {
            Ok(()) => {
                info!(%branch, "removed redundant temporary branch");
                deleted.push(branch);
            }
            Err(e) => warn!(%branch, error = %e, "could not remove temporary branch"),
        }
    }
    Ok(deleted)
}

/// Delete the head branch of a bot pull request that was closed by merging.
///
/// Returns whether a branch was deleted.
pub async fn remove_merged_pull_request_branch(
    event: &PullRequestEvent,
    config: &BotConfig,
    platform: &dyn PlatformService,
) -> bool {
    if !event.is_closed_by_merge() {
        debug!(pr = event.number, action = %event.action, "pull request not closed by merge");
        return false;
    }

    let head = BranchName::new(event.head_ref.as_str());
    if !head.has_prefix(&config.created_branches_prefix) {
        debug!(pr = event.number, branch = %head, "pull request head is not a temporary branch");
        return false;
    }

    match platform.delete_branch(&head).await {
        Ok(()) => {
            info!(pr = event.number, branch = %head, "removed branch of merged pull request");
            true
        }
        Err(e) => {
            warn!(pr = event.number, branch = %head, error = %e, "could not remove branch of merged pull request");
            false
        }
    }
}
