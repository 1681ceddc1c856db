//! Slack notifier using the Web API

use crate::error::{Error, Result};
use crate::notify::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const SLACK_API: &str = "https://slack.com/api";

#[derive(Deserialize)]
struct SlackResponse<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    data: T,
}

#[derive(Deserialize)]
struct LookupData {
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Deserialize)]
struct SlackUser {
    id: String,
}

#[derive(Deserialize)]
struct Ignored {}

/// Sends direct messages through a Slack bot token
///
/// Contacts with an email address are messaged directly. Anything else is
/// mentioned by name in the first configured channel.
pub struct SlackNotifier {
    client: Client,
    token: String,
    channels: Vec<String>,
    sender: String,
    api_base: String,
}

impl SlackNotifier {
    /// Create a notifier.
    ///
    /// `channels` is a comma separated list; `api_base` overrides the Slack
    /// API root.
    pub fn new(token: &str, channels: &str, sender: &str, api_base: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("automerge-bot")
            .build()
            .map_err(|e| Error::Notification(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            channels: channels
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ToString::to_string)
                .collect(),
            sender: sender.to_string(),
            api_base: api_base.unwrap_or(SLACK_API).trim_end_matches('/').to_string(),
        })
    }

    async fn lookup_user_by_email(&self, email: &str) -> Result<String> {
        let url = format!("{}/users.lookupByEmail", self.api_base);
        let response: SlackResponse<LookupData> = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Slack user lookup failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Notification(format!("Failed to parse Slack response: {e}")))?;

        if !response.ok {
            return Err(Error::Notification(format!(
                "Slack user lookup for {email} failed: {}",
                response.error.unwrap_or_default()
            )));
        }

        response
            .data
            .user
            .map(|u| u.id)
            .ok_or_else(|| Error::Notification(format!("Slack has no user for {email}")))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let response: SlackResponse<Ignored> = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "channel": channel,
                "text": text,
                "username": self.sender,
            }))
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Slack postMessage failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Notification(format!("Failed to parse Slack response: {e}")))?;

        if response.ok {
            Ok(())
        } else {
            Err(Error::Notification(format!(
                "Slack postMessage to {channel} failed: {}",
                response.error.unwrap_or_default()
            )))
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, contact: &str, subject_url: &str) -> Result<()> {
        let text = format!(
            "Pull request {subject_url} is still waiting to be merged manually. Please resolve conflicts and merge it."
        );

        if contact.contains('@') {
            let user_id = self.lookup_user_by_email(contact).await?;
            debug!(contact, user_id = %user_id, "sending Slack direct message");
            return self.post_message(&user_id, &text).await;
        }

        let channel = self.channels.first().ok_or_else(|| {
            Error::Notification(format!("no Slack channel configured to notify {contact}"))
        })?;
        debug!(contact, channel = %channel, "sending Slack channel message");
        self.post_message(channel, &format!("@{contact} {text}"))
            .await
    }
}
