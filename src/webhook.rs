//! GitHub webhook payload parsing
//!
//! Only the fields the bot acts on are deserialized. Anything missing that
//! the bot needs is reported as [`Error::Payload`].

use crate::error::{Error, Result};
use crate::types::{CommitAuthor, PullRequestEvent, PushEvent};
use serde::Deserialize;

/// A parsed webhook notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `push`
    Push(PushEvent),
    /// `pull_request`
    PullRequest(PullRequestEvent),
    /// `ping`, sent when the hook is registered
    Ping,
    /// Any other event, by name
    Unsupported(String),
}

#[derive(Deserialize)]
struct RepositoryPayload {
    id: Option<u64>,
}

#[derive(Deserialize)]
struct AuthorPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct HeadCommitPayload {
    id: Option<String>,
    author: Option<AuthorPayload>,
}

#[derive(Deserialize)]
struct CommitPayload {
    id: Option<String>,
}

#[derive(Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    created: bool,
    #[serde(default)]
    forced: bool,
    #[serde(default)]
    deleted: bool,
    repository: Option<RepositoryPayload>,
    #[serde(default)]
    head_commit: Option<HeadCommitPayload>,
    #[serde(default)]
    commits: Vec<CommitPayload>,
}

#[derive(Deserialize)]
struct BranchRefPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    #[serde(default)]
    merged: Option<bool>,
    head: Option<BranchRefPayload>,
    base: Option<BranchRefPayload>,
}

#[derive(Deserialize)]
struct PullRequestEventPayload {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<PullRequestPayload>,
    repository: Option<RepositoryPayload>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::Payload(format!("missing field '{field}'")))
}

fn parse_push(body: &[u8]) -> Result<PushEvent> {
    let payload: PushPayload = serde_json::from_slice(body)
        .map_err(|e| Error::Payload(format!("malformed push payload: {e}")))?;

    let repository_id = required(payload.repository.and_then(|r| r.id), "repository.id")?;
    let git_ref = required(payload.git_ref, "ref")?;

    // Deleting a ref leaves no head commit; such pushes are rejected later anyway
    let (head_commit_sha, head_commit_author) = match payload.head_commit {
        Some(head) => {
            let sha = required(head.id, "head_commit.id")?;
            let author = required(head.author, "head_commit.author")?;
            let user_name = required(
                author.username.filter(|u| !u.is_empty()).or(author.name),
                "head_commit.author.username",
            )?;
            (
                sha,
                CommitAuthor {
                    user_name,
                    email: author.email.unwrap_or_default(),
                },
            )
        }
        None if payload.deleted => (
            payload.after.unwrap_or_default(),
            CommitAuthor {
                user_name: String::new(),
                email: String::new(),
            },
        ),
        None => return Err(Error::Payload("missing field 'head_commit'".to_string())),
    };

    let commit_shas = payload
        .commits
        .into_iter()
        .map(|c| required(c.id, "commits[].id"))
        .collect::<Result<Vec<_>>>()?;

    Ok(PushEvent {
        repository_id,
        git_ref,
        head_commit_sha,
        created: payload.created,
        forced: payload.forced,
        deleted: payload.deleted,
        head_commit_author,
        commit_shas,
    })
}

fn parse_pull_request(body: &[u8]) -> Result<PullRequestEvent> {
    let payload: PullRequestEventPayload = serde_json::from_slice(body)
        .map_err(|e| Error::Payload(format!("malformed pull_request payload: {e}")))?;

    let pr = required(payload.pull_request, "pull_request")?;
    Ok(PullRequestEvent {
        repository_id: required(payload.repository.and_then(|r| r.id), "repository.id")?,
        action: required(payload.action, "action")?,
        number: required(payload.number, "number")?,
        merged: pr.merged.unwrap_or(false),
        head_ref: required(pr.head.and_then(|h| h.git_ref), "pull_request.head.ref")?,
        base_ref: required(pr.base.and_then(|b| b.git_ref), "pull_request.base.ref")?,
    })
}

impl WebhookEvent {
    /// Parse a notification given its `X-GitHub-Event` name and raw body
    pub fn parse(event_name: &str, body: &[u8]) -> Result<Self> {
        match event_name {
            "push" => parse_push(body).map(Self::Push),
            "pull_request" => parse_pull_request(body).map(Self::PullRequest),
            "ping" => Ok(Self::Ping),
            other => Ok(Self::Unsupported(other.to_string())),
        }
    }
}
