//! Core types for automerge-bot

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every branch ref
pub const REFS_HEADS: &str = "refs/heads/";

/// Length of the abbreviated commit sha used in branch names and titles
pub const SHORT_SHA_LEN: usize = 8;

/// Abbreviate a commit sha to its first [`SHORT_SHA_LEN`] characters.
pub fn short_sha(sha: &str) -> &str {
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

/// A branch name, without the `refs/heads/` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Wrap a plain branch name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parse a `refs/heads/<name>` ref
    pub fn from_ref(git_ref: &str) -> Result<Self> {
        git_ref
            .strip_prefix(REFS_HEADS)
            .map(Self::new)
            .ok_or_else(|| Error::InvalidRef(git_ref.to_string()))
    }

    /// Branch name as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full ref (`refs/heads/<name>`)
    pub fn git_ref(&self) -> String {
        format!("{REFS_HEADS}{}", self.0)
    }

    /// Name safe for embedding into another branch name
    pub fn sanitized(&self) -> String {
        Self::sanitize(&self.0)
    }

    /// Replace every `/` with `-`
    pub fn sanitize(name: &str) -> String {
        name.replace('/', "-")
    }

    /// Whether the name starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identity of a commit author as reported by a push payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// GitHub username (falls back to the git author name)
    pub user_name: String,
    /// Author email
    pub email: String,
}

/// A push notification, already authenticated and parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Numeric id of the repository that received the push
    pub repository_id: u64,
    /// Ref that was pushed (`refs/heads/...`, `refs/tags/...`)
    pub git_ref: String,
    /// Sha of the head commit after the push
    pub head_commit_sha: String,
    /// Push created the ref
    pub created: bool,
    /// Push was a force-push
    pub forced: bool,
    /// Push deleted the ref
    pub deleted: bool,
    /// Author of the head commit
    pub head_commit_author: CommitAuthor,
    /// Shas of every commit included in the push, oldest first
    pub commit_shas: Vec<String>,
}

impl PushEvent {
    /// Branch the push landed on
    pub fn pushed_branch(&self) -> Result<BranchName> {
        BranchName::from_ref(&self.git_ref)
    }

    /// Whether the pushed ref lives under `refs/heads/`
    pub fn is_branch_push(&self) -> bool {
        self.git_ref.starts_with(REFS_HEADS)
    }

    /// Abbreviated head commit sha
    pub fn short_head_sha(&self) -> &str {
        short_sha(&self.head_commit_sha)
    }
}

/// A GitHub account referenced by a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name
    pub login: String,
    /// Numeric user id
    pub id: u64,
    /// Public email, if the user exposes one
    pub email: Option<String>,
}

impl Account {
    /// Email to use in a `Co-authored-by` trailer.
    ///
    /// Users without a public email get their GitHub no-reply address.
    pub fn co_author_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}+{}@users.noreply.github.com", self.id, self.login))
    }

    /// Address used when notifying this user out-of-band
    pub fn contact_address(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.login.clone())
    }
}

/// An open pull request as seen through the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Web URL for the PR
    pub html_url: String,
    /// Login of the user who opened the PR
    pub author: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// When the PR was opened
    pub created_at: DateTime<Utc>,
    /// Assigned users
    pub assignees: Vec<Account>,
}

/// A branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Tip commit sha
    pub sha: String,
}

/// A commit as returned by the git data API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit sha
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Parent commit shas, in order
    pub parent_shas: Vec<String>,
}

/// Result of asking GitHub to merge a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The pull request was merged
    Merged {
        /// Merge commit sha, when reported
        sha: Option<String>,
    },
    /// GitHub refused because the pull request cannot be merged cleanly
    Conflict {
        /// GitHub's explanation
        message: String,
    },
}

impl MergeOutcome {
    /// Whether the merge happened
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// A `pull_request` webhook notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// Numeric id of the repository
    pub repository_id: u64,
    /// Webhook action (`opened`, `closed`, ...)
    pub action: String,
    /// PR number
    pub number: u64,
    /// Whether the PR has been merged
    pub merged: bool,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
}

impl PullRequestEvent {
    /// Whether this notification reports a PR closed by merging it
    pub fn is_closed_by_merge(&self) -> bool {
        self.action.eq_ignore_ascii_case("closed") && self.merged
    }
}
