//! Re-attempting merges that were left open earlier

use crate::automerge::performer;
use crate::config::BotConfig;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{BranchName, PullRequest};
use tracing::{debug, info, warn};

/// Tally of one retry pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySummary {
    /// Pull requests considered
    pub attempted: usize,
    /// Pull requests that merged this time
    pub merged: Vec<u64>,
    /// Pull requests whose retry failed outright
    pub failed: Vec<u64>,
}

/// Open pull requests the bot owns that target `destination`
pub fn pending_for<'a>(
    prs: &'a [PullRequest],
    destination: &BranchName,
    config: &BotConfig,
) -> Vec<&'a PullRequest> {
    prs.iter()
        .filter(|pr| pr.base_ref == destination.as_str() && pr.author == config.bot_user_name)
        .collect()
}

/// Retry every pending bot pull request into `destination`.
///
/// Each retry is independent; a failure is logged and the pass continues.
pub async fn retry_pending_merges(
    destination: &BranchName,
    config: &BotConfig,
    platform: &dyn PlatformService,
) -> Result<RetrySummary> {
    let open = platform.list_open_prs().await?;
    let pending = pending_for(&open, destination, config);
    debug!(%destination, count = pending.len(), "retrying pending pull requests");

    let mut summary = RetrySummary {
        attempted: pending.len(),
        ..RetrySummary::default()
    };
    for pr in pending {
        match performer::merge_existing_pr(pr, platform).await {
            Ok(true) => summary.merged.push(pr.number),
            Ok(false) => {}
            Err(e) => {
                warn!(pr = pr.number, error = %e, "retrying pull request merge failed");
                summary.failed.push(pr.number);
            }
        }
    }

    if !summary.merged.is_empty() {
        info!(%destination, merged = ?summary.merged, "pending pull requests merged");
    }
    Ok(summary)
}
