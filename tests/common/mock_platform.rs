//! Mock platform service and notifier for testing
//!
//! These are test utilities - not every helper is used by every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use automerge_bot::error::{Error, Result};
use automerge_bot::notify::Notifier;
use automerge_bot::platform::PlatformService;
use automerge_bot::types::{Branch, BranchName, Commit, MergeOutcome, PullRequest};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBranchCall {
    pub branch: String,
    pub sha: String,
}

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub commit_message: String,
}

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `request_reviewers` and `add_assignees`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersCall {
    pub pr_number: u64,
    pub logins: Vec<String>,
}

/// In-memory repository implementing `PlatformService`
///
/// Hand-written rather than generated so tests can keep state between calls:
/// - Branches appear on `create_branch` and vanish on `delete_branch`
/// - Pull requests get auto-incrementing numbers and stay open until merged
/// - Every call is recorded for verification
/// - Any operation can be made to fail
pub struct MockPlatformService {
    repository_id: u64,
    bot_login: String,
    next_pr_number: AtomicU64,
    branches: Mutex<Vec<Branch>>,
    commits: Mutex<HashMap<String, Commit>>,
    open_prs: Mutex<Vec<PullRequest>>,
    merge_responses: Mutex<HashMap<u64, MergeOutcome>>,
    // Call tracking
    repository_id_calls: AtomicU64,
    list_open_prs_calls: AtomicU64,
    create_branch_calls: Mutex<Vec<CreateBranchCall>>,
    delete_branch_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    comment_calls: Mutex<Vec<CreateCommentCall>>,
    review_calls: Mutex<Vec<UsersCall>>,
    assign_calls: Mutex<Vec<UsersCall>>,
    // Error injection
    error_on_repository_id: Mutex<Option<String>>,
    error_on_create_branch: Mutex<Option<String>>,
    error_on_delete_branch: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_list_open_prs: Mutex<Option<String>>,
    error_on_merge_pr: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
    error_on_request_reviewers: Mutex<Option<String>>,
}

fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
    match slot.lock().unwrap().clone() {
        Some(msg) => Err(Error::Platform(msg)),
        None => Ok(()),
    }
}

impl MockPlatformService {
    /// Create a mock for repository `repository_id`, with pull requests
    /// opened by `bot_login`
    pub fn new(repository_id: u64, bot_login: &str) -> Self {
        Self {
            repository_id,
            bot_login: bot_login.to_string(),
            next_pr_number: AtomicU64::new(1),
            branches: Mutex::new(Vec::new()),
            commits: Mutex::new(HashMap::new()),
            open_prs: Mutex::new(Vec::new()),
            merge_responses: Mutex::new(HashMap::new()),
            repository_id_calls: AtomicU64::new(0),
            list_open_prs_calls: AtomicU64::new(0),
            create_branch_calls: Mutex::new(Vec::new()),
            delete_branch_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
            review_calls: Mutex::new(Vec::new()),
            assign_calls: Mutex::new(Vec::new()),
            error_on_repository_id: Mutex::new(None),
            error_on_create_branch: Mutex::new(None),
            error_on_delete_branch: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_list_open_prs: Mutex::new(None),
            error_on_merge_pr: Mutex::new(None),
            error_on_comment: Mutex::new(None),
            error_on_request_reviewers: Mutex::new(None),
        }
    }

    // === Canned state ===

    /// Add an existing branch
    pub fn add_branch(&self, name: &str, sha: &str) {
        self.branches.lock().unwrap().push(Branch {
            name: name.to_string(),
            sha: sha.to_string(),
        });
    }

    /// Add a commit that `get_commit` can return
    pub fn add_commit(&self, sha: &str, message: &str, parents: &[&str]) {
        self.commits.lock().unwrap().insert(
            sha.to_string(),
            Commit {
                sha: sha.to_string(),
                message: message.to_string(),
                parent_shas: parents.iter().map(ToString::to_string).collect(),
            },
        );
    }

    /// Add an already open pull request
    pub fn add_open_pr(&self, pr: PullRequest) {
        self.next_pr_number.fetch_max(pr.number + 1, Ordering::SeqCst);
        self.open_prs.lock().unwrap().push(pr);
    }

    /// Set the response for `merge_pr` for a specific PR (default: merged)
    pub fn set_merge_response(&self, pr_number: u64, outcome: MergeOutcome) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, outcome);
    }

    /// Report a conflict when merging `pr_number`
    pub fn conflict_on(&self, pr_number: u64) {
        self.set_merge_response(
            pr_number,
            MergeOutcome::Conflict {
                message: "Pull Request is not mergeable".to_string(),
            },
        );
    }

    // === Error injection methods ===

    pub fn fail_repository_id(&self, msg: &str) {
        *self.error_on_repository_id.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_create_branch(&self, msg: &str) {
        *self.error_on_create_branch.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_delete_branch(&self, msg: &str) {
        *self.error_on_delete_branch.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_list_open_prs(&self, msg: &str) {
        *self.error_on_list_open_prs.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_merge_pr(&self, msg: &str) {
        *self.error_on_merge_pr.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_request_reviewers(&self, msg: &str) {
        *self.error_on_request_reviewers.lock().unwrap() = Some(msg.to_string());
    }

    // === Inspection ===

    pub fn branch_names(&self) -> Vec<String> {
        self.branches
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }

    pub fn open_pr_numbers(&self) -> Vec<u64> {
        self.open_prs.lock().unwrap().iter().map(|p| p.number).collect()
    }

    pub fn repository_id_call_count(&self) -> u64 {
        self.repository_id_calls.load(Ordering::SeqCst)
    }

    pub fn list_open_prs_call_count(&self) -> u64 {
        self.list_open_prs_calls.load(Ordering::SeqCst)
    }

    pub fn get_create_branch_calls(&self) -> Vec<CreateBranchCall> {
        self.create_branch_calls.lock().unwrap().clone()
    }

    pub fn get_delete_branch_calls(&self) -> Vec<String> {
        self.delete_branch_calls.lock().unwrap().clone()
    }

    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    pub fn get_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }

    pub fn get_review_calls(&self) -> Vec<UsersCall> {
        self.review_calls.lock().unwrap().clone()
    }

    pub fn get_assign_calls(&self) -> Vec<UsersCall> {
        self.assign_calls.lock().unwrap().clone()
    }

    // === Assertion helpers ===

    /// Assert that no mutating call was made
    pub fn assert_untouched(&self) {
        assert!(self.get_create_branch_calls().is_empty(), "unexpected create_branch");
        assert!(self.get_delete_branch_calls().is_empty(), "unexpected delete_branch");
        assert!(self.get_create_pr_calls().is_empty(), "unexpected create_pr");
        assert!(self.get_merge_pr_calls().is_empty(), "unexpected merge_pr");
        assert!(self.get_comment_calls().is_empty(), "unexpected comment");
    }

    /// Assert that `branch` was deleted
    pub fn assert_branch_deleted(&self, branch: &str) {
        let calls = self.get_delete_branch_calls();
        assert!(
            calls.iter().any(|b| b == branch),
            "expected delete_branch({branch}), got: {calls:?}"
        );
    }

    /// Assert that a comment containing `text` was posted on `pr_number`
    pub fn assert_commented(&self, pr_number: u64, text: &str) {
        let calls = self.get_comment_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.body.contains(text)),
            "expected comment on #{pr_number} containing {text:?}, got: {calls:?}"
        );
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn repository_id(&self) -> Result<u64> {
        self.repository_id_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.error_on_repository_id)?;
        Ok(self.repository_id)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        Ok(self.branches.lock().unwrap().clone())
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        self.commits
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .ok_or_else(|| Error::Platform(format!("commit {sha} not found")))
    }

    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<()> {
        self.create_branch_calls.lock().unwrap().push(CreateBranchCall {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        injected(&self.error_on_create_branch)?;

        let mut branches = self.branches.lock().unwrap();
        if branches.iter().any(|b| b.name == branch.as_str()) {
            return Err(Error::Validation {
                status: 422,
                message: "Reference already exists".to_string(),
            });
        }
        branches.push(Branch {
            name: branch.to_string(),
            sha: sha.to_string(),
        });
        Ok(())
    }

    async fn delete_branch(&self, branch: &BranchName) -> Result<()> {
        self.delete_branch_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        injected(&self.error_on_delete_branch)?;

        let mut branches = self.branches.lock().unwrap();
        let before = branches.len();
        branches.retain(|b| b.name != branch.as_str());
        if branches.len() == before {
            return Err(Error::Validation {
                status: 422,
                message: "Reference does not exist".to_string(),
            });
        }
        Ok(())
    }

    async fn create_pr(
        &self,
        head: &BranchName,
        base: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        injected(&self.error_on_create_pr)?;

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = PullRequest {
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/acme/widgets/pull/{number}"),
            author: self.bot_login.clone(),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            created_at: Utc::now(),
            assignees: Vec::new(),
        };
        self.open_prs.lock().unwrap().push(pr.clone());
        Ok(pr)
    }

    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        self.list_open_prs_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.error_on_list_open_prs)?;
        Ok(self.open_prs.lock().unwrap().clone())
    }

    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeOutcome> {
        self.merge_pr_calls.lock().unwrap().push(MergePrCall {
            pr_number,
            commit_message: commit_message.to_string(),
        });
        injected(&self.error_on_merge_pr)?;

        let outcome = self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or(MergeOutcome::Merged {
                sha: Some(format!("merge{pr_number}")),
            });
        if outcome.is_merged() {
            self.open_prs
                .lock()
                .unwrap()
                .retain(|p| p.number != pr_number);
        }
        Ok(outcome)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.comment_calls.lock().unwrap().push(CreateCommentCall {
            pr_number,
            body: body.to_string(),
        });
        injected(&self.error_on_comment)
    }

    async fn request_reviewers(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        self.review_calls.lock().unwrap().push(UsersCall {
            pr_number,
            logins: logins.to_vec(),
        });
        injected(&self.error_on_request_reviewers)
    }

    async fn add_assignees(&self, pr_number: u64, logins: &[String]) -> Result<()> {
        self.assign_calls.lock().unwrap().push(UsersCall {
            pr_number,
            logins: logins.to_vec(),
        });
        Ok(())
    }
}

/// Notifier that records every message
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing_contacts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Make notifications to `contact` fail
    pub fn fail_for(&self, contact: &str) {
        self.failing_contacts
            .lock()
            .unwrap()
            .push(contact.to_string());
    }

    /// `(contact, subject_url)` pairs that were delivered
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, contact: &str, subject_url: &str) -> Result<()> {
        if self.failing_contacts.lock().unwrap().iter().any(|c| c == contact) {
            return Err(Error::Notification(format!("cannot reach {contact}")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((contact.to_string(), subject_url.to_string()));
        Ok(())
    }
}
