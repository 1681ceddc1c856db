//! Background loop reminding people about bot pull requests left open

use crate::automerge::PULL_REQUEST_TITLE_PREFIX;
use crate::config::{BotConfig, SharedConfig};
use crate::error::{Error, Result};
use crate::notify::{Notifier, notifier_for};
use crate::platform::PlatformService;
use crate::types::PullRequest;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Bot pull requests opened before `now - time_limit`
pub fn stale_pull_requests<'a>(
    prs: &'a [PullRequest],
    config: &BotConfig,
    time_limit: Duration,
    now: DateTime<Utc>,
) -> Vec<&'a PullRequest> {
    let Some(cutoff) = TimeDelta::from_std(time_limit)
        .ok()
        .and_then(|limit| now.checked_sub_signed(limit))
    else {
        return Vec::new();
    };

    prs.iter()
        .filter(|pr| {
            pr.title.starts_with(PULL_REQUEST_TITLE_PREFIX)
                && pr.author == config.bot_user_name
                && pr.created_at < cutoff
        })
        .collect()
}

enum NotifierSource {
    Fixed(Arc<dyn Notifier>),
    // Picked from the live configuration on every tick
    Configured,
}

/// Periodically notifies assignees of stale bot pull requests
pub struct PullRequestGovernor {
    config: Arc<SharedConfig>,
    platform: Arc<dyn PlatformService>,
    notifier: NotifierSource,
    started: AtomicBool,
}

impl PullRequestGovernor {
    /// Create a governor that always uses `notifier`; nothing runs until
    /// [`start`](Self::start)
    pub fn new(
        config: Arc<SharedConfig>,
        platform: Arc<dyn PlatformService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_source(config, platform, NotifierSource::Fixed(notifier))
    }

    /// Create a governor that picks its notifier from the current
    /// configuration at every tick, so reloaded Slack settings apply
    pub fn with_configured_notifier(
        config: Arc<SharedConfig>,
        platform: Arc<dyn PlatformService>,
    ) -> Self {
        Self::with_source(config, platform, NotifierSource::Configured)
    }

    fn with_source(
        config: Arc<SharedConfig>,
        platform: Arc<dyn PlatformService>,
        notifier: NotifierSource,
    ) -> Self {
        Self {
            config,
            platform,
            notifier,
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the loop.
    ///
    /// Fails with [`Error::GovernorAlreadyStarted`] on a second call.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::GovernorAlreadyStarted);
        }

        info!("starting pull request governor");
        let governor = Arc::clone(self);
        Ok(tokio::spawn(async move { governor.run().await }))
    }

    async fn run(&self) {
        loop {
            if let Err(e) = self.tick(Utc::now()).await {
                error!(error = %e, "pull request governor check failed");
            }
            // Re-read every round so a reload changes the interval
            let frequency = self.config.snapshot().config.governor.check_frequency();
            debug!(seconds = frequency.as_secs(), "pull request governor sleeping");
            tokio::time::sleep(frequency).await;
        }
    }

    /// Run one check as of `now`. Returns how many pull requests were stale.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize> {
        let snapshot = self.config.snapshot();
        let config = &snapshot.config;
        let time_limit = config.governor.pull_request_time_limit();

        let open = self.platform.list_open_prs().await?;
        let stale = stale_pull_requests(&open, config, time_limit, now);
        if stale.is_empty() {
            debug!("no stale pull requests");
            return Ok(0);
        }

        info!(count = stale.len(), "found stale pull requests");
        let notifier = match &self.notifier {
            NotifierSource::Fixed(notifier) => Arc::clone(notifier),
            NotifierSource::Configured => notifier_for(config)?,
        };
        for pr in &stale {
            for assignee in &pr.assignees {
                let contact = assignee.contact_address();
                if let Err(e) = notifier.notify(&contact, &pr.html_url).await {
                    warn!(pr = pr.number, contact = %contact, error = %e, "could not notify assignee");
                }
            }
        }
        Ok(stale.len())
    }
}
