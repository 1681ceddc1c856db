//! Error types for automerge-bot

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the bot
#[derive(Debug, Error)]
pub enum Error {
    /// Generic failure talking to the GitHub API
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitHub rejected the request with a human-readable reason
    #[error("GitHub rejected the request ({status}): {message}")]
    Validation {
        /// HTTP status returned by GitHub
        status: u16,
        /// First error message reported by GitHub
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// More merge directions configured than allowed
    #[error("too many merge directions: {count} configured, at most {max} allowed")]
    TooManyMergeDirections {
        /// Number of distinct directions supplied
        count: usize,
        /// Upper bound
        max: usize,
    },

    /// Merge directions form a cycle
    #[error("merge directions contain a cycle: {0}")]
    MergeDirectionCycle(String),

    /// A git ref that is not a branch ref
    #[error("not a branch ref: {0}")]
    InvalidRef(String),

    /// Webhook payload is missing a field or malformed
    #[error("invalid webhook payload: {0}")]
    Payload(String),

    /// Messaging integration failure
    #[error("notification failed: {0}")]
    Notification(String),

    /// Platform-level failure not originating from octocrab
    #[error("platform error: {0}")]
    Platform(String),

    /// The stale pull request governor was started twice
    #[error("pull request governor is already running")]
    GovernorAlreadyStarted,
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if status == 422 {
                    let message = source
                        .errors
                        .as_ref()
                        .and_then(|errors| errors.first())
                        .and_then(first_error_message)
                        .unwrap_or_else(|| source.message.clone());
                    Self::Validation { status, message }
                } else {
                    Self::GitHubApi(format!("HTTP {status}: {}", source.message))
                }
            }
            other => Self::GitHubApi(other.to_string()),
        }
    }
}

/// Extract the message of a nested GitHub error entry.
///
/// Entries are either objects with a `message` (or `code`) field or plain strings.
fn first_error_message(entry: &serde_json::Value) -> Option<String> {
    match entry {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("code"))
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}
