//! Out-of-band notifications to humans
//!
//! Used by the stale pull request governor. When no messaging integration is
//! configured the [`NullNotifier`] is used instead.

mod slack;

pub use slack::SlackNotifier;

use crate::config::BotConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Delivers a message about `subject_url` to a person
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify the person reachable at `contact` (an email or a login)
    async fn notify(&self, contact: &str, subject_url: &str) -> Result<()>;
}

/// Notifier that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, contact: &str, subject_url: &str) -> Result<()> {
        debug!(contact, subject_url, "notification dropped, no messaging configured");
        Ok(())
    }
}

/// Pick the notifier matching the configuration
pub fn notifier_for(config: &BotConfig) -> Result<Arc<dyn Notifier>> {
    let governor = &config.governor;
    match (&governor.slack_token, &governor.slack_channels) {
        (Some(token), Some(channels)) if governor.slack_configured() => Ok(Arc::new(
            SlackNotifier::new(
                token,
                channels,
                &config.bot_user_name,
                governor.slack_api_url.as_deref(),
            )?,
        )),
        _ => {
            debug!("using null notifier because Slack configuration is missing or incomplete");
            Ok(Arc::new(NullNotifier))
        }
    }
}
