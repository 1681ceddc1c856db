//! Error-logging decorator for platform services
//!
//! Every failed repository call is logged once, at the boundary, with GitHub
//! validation rejections kept apart from outright failures. Errors are passed
//! through unchanged so callers still decide how to recover.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{Branch, BranchName, Commit, MergeOutcome, PullRequest};
use async_trait::async_trait;
use tracing::{error, warn};

/// Wraps a [`PlatformService`] and logs every error it returns
pub struct LoggingPlatform<P> {
    inner: P,
}

impl<P: PlatformService> LoggingPlatform<P> {
    /// Wrap `inner`
    pub const fn new(inner: P) -> Self {
        Self { inner }
    }
}

fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        match e {
            Error::Validation { status, message } => warn!(
                operation,
                status,
                github_message = %message,
                "GitHub rejected repository call"
            ),
            other => error!(operation, error = %other, "failed performing repository call"),
        }
    }
    result
}

#[async_trait]
impl<P: PlatformService> PlatformService for LoggingPlatform<P> {
    async fn repository_id(&self) -> Result<u64> {
        logged("repository_id", self.inner.repository_id().await)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        logged("list_branches", self.inner.list_branches().await)
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        logged("get_commit", self.inner.get_commit(sha).await)
    }

    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<()> {
        logged("create_branch", self.inner.create_branch(branch, sha).await)
    }

    async fn delete_branch(&self, branch: &BranchName) -> Result<()> {
        logged("delete_branch", self.inner.delete_branch(branch).await)
    }

    async fn create_pr(
        &self,
        head: &BranchName,
        base: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        logged(
            "create_pr",
            self.inner.create_pr(head, base, title, body).await,
        )
    }

    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        logged("list_open_prs", self.inner.list_open_prs().await)
    }

    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeOutcome> {
        logged("merge_pr", self.inner.merge_pr(pr_number, commit_message).await)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        logged(
            "create_pr_comment",
            self.inner.create_pr_comment(pr_number, body).await,
        )
    }

    async fn request_reviewers(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        logged(
            "request_reviewers",
            self.inner.request_reviewers(pr_number, logins).await,
        )
    }

    async fn add_assignees(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        logged(
            "add_assignees",
            self.inner.add_assignees(pr_number, logins).await,
        )
    }
}
