//! Git hosting platform access
//!
//! The bot only ever talks to the hosting side through [`PlatformService`],
//! which keeps the merge logic independent of octocrab and easy to drive from
//! tests.

mod github;
mod logging;

pub use github::GitHubService;
pub use logging::LoggingPlatform;

use crate::error::Result;
use crate::types::{Branch, BranchName, Commit, MergeOutcome, PullRequest};
use async_trait::async_trait;

/// Repository operations the bot needs
///
/// Every method targets the single monitored repository the service was
/// created for.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Numeric id of the monitored repository
    async fn repository_id(&self) -> Result<u64>;

    /// All branches with their tip commits
    async fn list_branches(&self) -> Result<Vec<Branch>>;

    /// Fetch a commit's message and parents
    async fn get_commit(&self, sha: &str) -> Result<Commit>;

    /// Create `branch` pointing at `sha`
    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<()>;

    /// Delete `branch`
    async fn delete_branch(&self, branch: &BranchName) -> Result<()>;

    /// Open a pull request from `head` into `base`
    async fn create_pr(
        &self,
        head: &BranchName,
        base: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// All open pull requests
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>>;

    /// Merge a pull request with a merge commit.
    ///
    /// The first line of `commit_message` becomes the commit title, the rest
    /// its body. A pull request that cannot be merged cleanly is reported as
    /// [`MergeOutcome::Conflict`], not as an error.
    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeOutcome>;

    /// Comment on a pull request
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Request reviews from users
    async fn request_reviewers(&self, pr_number: u64, logins: &[String]) -> Result<()>;

    /// Assign users to a pull request
    async fn add_assignees(&self, pr_number: u64, logins: &[String]) -> Result<()>;
}
