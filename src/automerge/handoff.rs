//! Hands a conflicting merge over to the responsible human

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{BranchName, PullRequest};
use tracing::{info, warn};

/// Builds the instructions posted on a pull request that cannot be merged.
///
/// The person merges the temporary branch into the destination locally,
/// approves the pull request at `pr_url` and pushes the destination.
pub fn conflict_comment(
    user: &str,
    pr_url: &str,
    temp_branch: &BranchName,
    destination: &BranchName,
) -> String {
    let temp = temp_branch.as_str();
    let dest = destination.as_str();
    format!(
        "Cannot merge automatically. @{user} please resolve conflicts manually, approve review and merge pull request.\n\n\
         How to do it (using git command line):\n\
         1. Fetch changes from server and checkout '{dest}' branch\n\
         ```\n\
         git fetch -q\n\
         git checkout {dest} -q\n\
         git reset --hard origin/{dest} -q\n\
         ```\n\
         2. Merge '{temp}' branch and resolve conflicts\n\
         ```\n\
         git merge --no-ff origin/{temp}\n\
         ```\n\
         3. Approve the [pull request]({pr_url}) review\n\
         4. Push changes to server\n\
         ```\n\
         git push origin {dest}\n\
         ```\n\
         5. Delete the '{temp}' branch\n\
         ```\n\
         git push origin --delete {temp}\n\
         ```\n"
    )
}

/// Notifies a person that a pull request needs manual conflict resolution.
///
/// Three platform calls are made (comment, review request, assignment). They
/// are independent: each failure is logged and the remaining calls still run.
/// The first failure is returned once all calls have been attempted.
pub async fn notify_unresolved_conflicts(
    platform: &dyn PlatformService,
    pr: &PullRequest,
    user: &str,
    temp_branch: &BranchName,
    destination: &BranchName,
) -> Result<()> {
    info!(pr = pr.number, user, "handing conflicting pull request over");

    let logins = vec![user.to_string()];
    let mut first_error: Option<Error> = None;
    let mut record = |step: &'static str, result: Result<()>| {
        if let Err(e) = result {
            warn!(pr = pr.number, step, error = %e, "conflict hand-off step failed");
            first_error.get_or_insert(e);
        }
    };

    record(
        "comment",
        platform
            .create_pr_comment(
                pr.number,
                &conflict_comment(user, &pr.html_url, temp_branch, destination),
            )
            .await,
    );
    record(
        "request_reviewer",
        platform.request_reviewers(pr.number, &logins).await,
    );
    record("assign", platform.add_assignees(pr.number, &logins).await);

    first_error.map_or(Ok(()), Err)
}
