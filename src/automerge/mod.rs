//! Push-driven merge propagation
//!
//! [`PushHandler`] is the entry point for webhook notifications. For an
//! accepted push it first merges the pushed commit into every destination of
//! the pushed branch (the critical part), then cleans up temporary branches
//! and retries earlier pull requests (the non-critical part). Failures are
//! logged and never returned.

pub mod handoff;
pub mod performer;
pub mod predicate;
pub mod retry;

pub use performer::AttemptOutcome;
pub use retry::RetrySummary;

use crate::cleanup;
use crate::config::SharedConfig;
use crate::platform::PlatformService;
use crate::types::{BranchName, PullRequestEvent, PushEvent};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Title prefix of every pull request opened by the bot
pub const PULL_REQUEST_TITLE_PREFIX: &str = "Automerge";

/// Comment posted when a previously conflicting pull request gets merged
pub const SUCCESSFUL_MERGE_COMMENT: &str = "Your changes have been successfully merged";

/// Result of one merge attempt for a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    /// Destination branch of the attempt
    pub destination: BranchName,
    /// Outcome, or the error message if the attempt failed
    pub outcome: std::result::Result<AttemptOutcome, String>,
}

/// What processing a push did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Whether the push passed the acceptance checks
    pub accepted: bool,
    /// One entry per destination, in configured order
    pub attempts: Vec<AttemptReport>,
    /// Temporary branches removed after the push
    pub removed_branches: Vec<BranchName>,
    /// Retry pass over pending pull requests, if it ran
    pub retried: Option<RetrySummary>,
}

/// Processes push and pull request notifications for the monitored repository
#[derive(Clone)]
pub struct PushHandler {
    config: Arc<SharedConfig>,
    platform: Arc<dyn PlatformService>,
}

impl PushHandler {
    /// Create a handler
    pub fn new(config: Arc<SharedConfig>, platform: Arc<dyn PlatformService>) -> Self {
        Self { config, platform }
    }

    /// Process a push notification
    pub async fn handle_push(&self, push: &PushEvent) -> PushReport {
        let span = info_span!(
            "push",
            git_ref = %push.git_ref,
            sha = %push.short_head_sha(),
            author = %push.head_commit_author.user_name
        );
        self.process_push(push).instrument(span).await
    }

    async fn process_push(&self, push: &PushEvent) -> PushReport {
        // One snapshot for the whole push, even if a reload lands meanwhile
        let snapshot = self.config.snapshot();
        let (config, directions) = (&snapshot.config, &snapshot.directions);
        let platform = self.platform.as_ref();

        match predicate::can_process_push(push, config, platform).await {
            Ok(true) => {}
            Ok(false) => {
                info!("push rejected");
                return PushReport::default();
            }
            Err(e) => {
                warn!(error = %e, "could not check push, skipping it");
                return PushReport::default();
            }
        }

        let mut report = PushReport {
            accepted: true,
            ..PushReport::default()
        };
        let source = match push.pushed_branch() {
            Ok(branch) => branch,
            Err(e) => {
                warn!(error = %e, "accepted push has no branch");
                return report;
            }
        };

        let destinations = directions.destinations_of(&source);
        if destinations.is_empty() {
            debug!(%source, "no merge directions from pushed branch");
        }
        for destination in destinations {
            let outcome =
                performer::merge_pushed_changes(push, &source, &destination, config, platform)
                    .await
                    .map_err(|e| {
                        error!(
                            critical = true,
                            %source,
                            %destination,
                            error = %e,
                            "merging pushed changes failed"
                        );
                        e.to_string()
                    });
            report.attempts.push(AttemptReport {
                destination,
                outcome,
            });
        }

        match cleanup::collect_merged_temp_branches(push, config, directions, platform).await {
            Ok(removed) => report.removed_branches = removed,
            Err(e) => error!(error = %e, "removing temporary branches failed"),
        }

        match retry::retry_pending_merges(&source, config, platform).await {
            Ok(summary) => report.retried = Some(summary),
            Err(e) => error!(error = %e, "retrying pending pull requests failed"),
        }

        report
    }

    /// Process a pull request notification
    pub async fn handle_pull_request(&self, event: &PullRequestEvent) -> bool {
        let snapshot = self.config.snapshot();
        let span = info_span!("pull_request", number = event.number, action = %event.action);
        cleanup::remove_merged_pull_request_branch(event, &snapshot.config, self.platform.as_ref())
            .instrument(span)
            .await
    }
}
