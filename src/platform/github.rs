//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{Account, Branch, BranchName, Commit, MergeOutcome, PullRequest};
use async_trait::async_trait;
use chrono::Utc;
use octocrab::Octocrab;
use octocrab::params::repos::Reference;
use serde::Deserialize;
use tracing::debug;

/// Page size used for paginated listings
const PER_PAGE: u8 = 100;

/// Status GitHub answers with when a pull request is not mergeable
const NOT_MERGEABLE_STATUS: u16 = 405;

#[derive(Deserialize)]
struct RepositoryPayload {
    id: u64,
}

#[derive(Deserialize)]
struct ShaPayload {
    sha: String,
}

#[derive(Deserialize)]
struct BranchPayload {
    name: String,
    commit: ShaPayload,
}

#[derive(Deserialize)]
struct CommitPayload {
    sha: String,
    message: String,
    #[serde(default)]
    parents: Vec<ShaPayload>,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubService {
    /// Create a new GitHub service.
    ///
    /// `base_uri` overrides the API root (GitHub Enterprise, tests).
    pub fn new(token: &str, owner: String, repo: String, base_uri: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    fn route(&self, path: &str) -> String {
        format!("/repos/{}/{}{path}", self.owner, self.repo)
    }
}

/// Split a commit message into GitHub's commit title and body
fn split_commit_message(message: &str) -> (&str, &str) {
    match message.split_once('\n') {
        Some((title, body)) => (title.trim_end(), body.trim()),
        None => (message, ""),
    }
}

fn account_from_octocrab(author: &octocrab::models::Author) -> Account {
    Account {
        login: author.login.clone(),
        id: author.id.0,
        email: author.email.clone(),
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        created_at: pr.created_at.unwrap_or_else(Utc::now),
        assignees: pr
            .assignees
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(account_from_octocrab)
            .collect(),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn repository_id(&self) -> Result<u64> {
        debug!(owner = %self.owner, repo = %self.repo, "getting repository");
        let repo: RepositoryPayload = self.client.get(self.route(""), None::<&()>).await?;
        Ok(repo.id)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        debug!(repo = %self.repo, "listing branches");
        let route = self.route("/branches");
        let mut branches = Vec::new();
        let mut page: u32 = 1;

        loop {
            let params = [("per_page", u32::from(PER_PAGE)), ("page", page)];
            let batch: Vec<BranchPayload> = self.client.get(&route, Some(&params)).await?;
            let fetched = batch.len();
            branches.extend(batch.into_iter().map(|b| Branch {
                name: b.name,
                sha: b.commit.sha,
            }));
            if fetched < usize::from(PER_PAGE) {
                break;
            }
            page += 1;
        }

        debug!(count = branches.len(), "listed branches");
        Ok(branches)
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        debug!(sha, "getting commit");
        let commit: CommitPayload = self
            .client
            .get(self.route(&format!("/git/commits/{sha}")), None::<&()>)
            .await?;
        Ok(Commit {
            sha: commit.sha,
            message: commit.message,
            parent_shas: commit.parents.into_iter().map(|p| p.sha).collect(),
        })
    }

    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<()> {
        debug!(%branch, sha, "creating branch");
        self.client
            .repos(&self.owner, &self.repo)
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &BranchName) -> Result<()> {
        debug!(%branch, "deleting branch");
        self.client
            .repos(&self.owner, &self.repo)
            .delete_ref(&Reference::Branch(branch.to_string()))
            .await?;
        Ok(())
    }

    async fn create_pr(
        &self,
        head: &BranchName,
        base: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        debug!(%head, %base, "creating PR");
        let pr = self
            .client
            .pulls(&self.owner, &self.repo)
            .create(title, head.as_str(), base.as_str())
            .body(body)
            .send()
            .await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        debug!(repo = %self.repo, "listing open PRs");
        let first_page = self
            .client
            .pulls(&self.owner, &self.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .send()
            .await?;
        let prs = self.client.all_pages(first_page).await?;

        debug!(count = prs.len(), "listed open PRs");
        Ok(prs.iter().map(pr_from_octocrab).collect())
    }

    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeOutcome> {
        debug!(pr_number, "merging PR");
        let (title, body) = split_commit_message(commit_message);

        let result = self
            .client
            .pulls(&self.owner, &self.repo)
            .merge(pr_number)
            .method(octocrab::params::pulls::MergeMethod::Merge)
            .title(title)
            .message(body)
            .send()
            .await;

        match result {
            Ok(merge) if merge.merged => {
                debug!(pr_number, sha = ?merge.sha, "merged PR");
                Ok(MergeOutcome::Merged { sha: merge.sha })
            }
            Ok(merge) => Ok(MergeOutcome::Conflict {
                message: merge.message.unwrap_or_default(),
            }),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == NOT_MERGEABLE_STATUS =>
            {
                debug!(pr_number, message = %source.message, "PR is not mergeable");
                Ok(MergeOutcome::Conflict {
                    message: source.message.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(&self.owner, &self.repo)
            .create_comment(pr_number, body)
            .await?;
        Ok(())
    }

    async fn request_reviewers(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        debug!(pr_number, ?logins, "requesting reviewers");
        self.client
            .pulls(&self.owner, &self.repo)
            .request_reviews(pr_number, logins.to_vec(), Vec::<String>::new())
            .await?;
        Ok(())
    }

    async fn add_assignees(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        debug!(pr_number, ?logins, "adding assignees");
        let logins: Vec<&str> = logins.iter().map(String::as_str).collect();
        self.client
            .issues(&self.owner, &self.repo)
            .add_assignees(pr_number, &logins)
            .await?;
        Ok(())
    }
}
