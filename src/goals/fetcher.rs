use super::types::*;
use crate::config::ActionItemsConfig;
use crate::github::{HostingApi, IssueSort, ReviewData, ReviewVerdict, SortDirection};
use crate::models::{RepoKey, Result};
use crate::wait::CancelSignal;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const RATE_LIMIT_LOW_WATER: u64 = 100;
const RATE_LIMIT_CRITICAL: u64 = 10;

const DEFAULT_OWNERSHIP_FILES: &[&str] = &["OWNERS", "OWNERS.md", "CODEOWNERS"];

/// The operator interrupted a rate-limit wait. Callers downcast to this to
/// tell an aborted run apart from an ordinary transient failure.
#[derive(Debug, Error)]
#[error("collection cancelled while waiting for rate limit reset")]
pub struct CollectionCancelled;

/// One collectible signal. Used to report which piece of data went missing
/// when a fetch is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    ActivityItems,
    BacklogCount,
    NewIssues,
    Ownership,
    UnrespondedIssues,
    UnreviewedPrs,
    FailingBranches,
    ApprovedPrs,
    ExternalContributorPrs,
    PrsAwaitingAuthor,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::ActivityItems => "activity-items",
            Signal::BacklogCount => "backlog-count",
            Signal::NewIssues => "new-issues",
            Signal::Ownership => "ownership",
            Signal::UnrespondedIssues => "unresponded-issues",
            Signal::UnreviewedPrs => "unreviewed-prs",
            Signal::FailingBranches => "failing-branches",
            Signal::ApprovedPrs => "approved-prs",
            Signal::ExternalContributorPrs => "external-contributor-prs",
            Signal::PrsAwaitingAuthor => "prs-awaiting-author",
        };
        write!(f, "{}", s)
    }
}

/// A signal that could not be collected for one repository. The run carries
/// on; the skip is recorded so callers (and tests) can see why data is
/// missing instead of finding a silent empty list.
#[derive(Debug, Clone)]
pub struct SkippedSignal {
    pub repo: RepoKey,
    pub signal: Signal,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct GoalsCollection {
    pub data: RawGoalsData,
    pub skipped: Vec<SkippedSignal>,
}

#[derive(Debug, Default)]
pub struct ActionCollection {
    pub items: ActionItems,
    pub skipped: Vec<SkippedSignal>,
}

/// Fetches goal signals and action items from the hosting API, one repository
/// and one signal at a time.
pub struct Fetcher {
    client: Arc<dyn HostingApi>,
    ownership_files: Vec<String>,
    cancel: CancelSignal,
}

impl Fetcher {
    pub fn new(
        client: Arc<dyn HostingApi>,
        ownership_files: Vec<String>,
        cancel: CancelSignal,
    ) -> Self {
        let ownership_files = if ownership_files.is_empty() {
            DEFAULT_OWNERSHIP_FILES
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            ownership_files
        };
        Self {
            client,
            ownership_files,
            cancel,
        }
    }

    /// Fetch all data needed for goals calculation. A failure on one signal
    /// leaves that signal out for that repository; only cancellation aborts
    /// the run.
    pub async fn fetch_goals_data(&mut self, repos: &[RepoKey]) -> Result<GoalsCollection> {
        let mut collection = GoalsCollection::default();

        for repo in repos {
            self.check_rate_limit().await?;

            match self.fetch_old_items(repo).await {
                Ok(items) => collection.data.activity_items.extend(items),
                Err(e) => collection.skip(repo, Signal::ActivityItems, e),
            }

            match self.fetch_backlog_count(repo).await {
                Ok(count) => collection.data.backlog_count += count,
                Err(e) => collection.skip(repo, Signal::BacklogCount, e),
            }

            match self.fetch_new_issues(repo).await {
                Ok(issues) => collection.data.new_issues.extend(issues),
                Err(e) => collection.skip(repo, Signal::NewIssues, e),
            }

            match self.fetch_ownership_status(repo).await {
                Ok(ownership) => collection.data.ownership_status.push(ownership),
                Err(e) => collection.skip(repo, Signal::Ownership, e),
            }
        }

        info!(
            activity_items = collection.data.activity_items.len(),
            backlog_count = collection.data.backlog_count,
            new_issues = collection.data.new_issues.len(),
            ownership_status = collection.data.ownership_status.len(),
            skipped = collection.skipped.len(),
            "Goals data fetched"
        );

        Ok(collection)
    }

    /// Fetch immediate action items across repositories. Thresholds are
    /// validated again here as a guard; config loading already rejects bad
    /// values before any network call.
    pub async fn fetch_action_items(
        &mut self,
        repos: &[RepoKey],
        cfg: &ActionItemsConfig,
    ) -> Result<ActionCollection> {
        cfg.validate()?;

        let mut collection = ActionCollection::default();
        collection.items.fetched_at = Some(Utc::now());

        for repo in repos {
            self.check_rate_limit().await?;

            match self
                .fetch_unresponded_issues(repo, cfg.issue_response_time_hours)
                .await
            {
                Ok(issues) => collection.items.unresponded_issues.extend(issues),
                Err(e) => collection.skip(repo, Signal::UnrespondedIssues, e),
            }

            match self
                .fetch_unreviewed_prs(repo, cfg.pr_review_wait_hours)
                .await
            {
                Ok(prs) => collection.items.unreviewed_prs.extend(prs),
                Err(e) => collection.skip(repo, Signal::UnreviewedPrs, e),
            }

            if cfg.check_default_branch_ci {
                match self.fetch_failing_branches(repo).await {
                    Ok(failing) => collection.items.failing_branches.extend(failing),
                    Err(e) => collection.skip(repo, Signal::FailingBranches, e),
                }
            }

            if cfg.check_approved_prs {
                match self.fetch_approved_prs_ready_to_merge(repo).await {
                    Ok(approved) => collection
                        .items
                        .approved_prs_ready_to_merge
                        .extend(approved),
                    Err(e) => collection.skip(repo, Signal::ApprovedPrs, e),
                }
            }

            if cfg.check_external_contributors {
                match self.fetch_external_contributor_prs(repo).await {
                    Ok(external) => collection
                        .items
                        .external_contributor_prs
                        .extend(external),
                    Err(e) => collection.skip(repo, Signal::ExternalContributorPrs, e),
                }
            }

            if cfg.check_prs_awaiting_author {
                match self
                    .fetch_prs_awaiting_author_response(repo, cfg.pr_awaiting_author_response_days)
                    .await
                {
                    Ok(awaiting) => collection
                        .items
                        .prs_awaiting_author_response
                        .extend(awaiting),
                    Err(e) => collection.skip(repo, Signal::PrsAwaitingAuthor, e),
                }
            }

            collection.items.total_checked += 1;
        }

        collection.items.recount();

        info!(
            unresponded_issues = collection.items.unresponded_issues.len(),
            unreviewed_prs = collection.items.unreviewed_prs.len(),
            failing_branches = collection.items.failing_branches.len(),
            approved_prs_ready = collection.items.approved_prs_ready_to_merge.len(),
            external_contributor_prs = collection.items.external_contributor_prs.len(),
            prs_awaiting_author = collection.items.prs_awaiting_author_response.len(),
            total_items = collection.items.total_items,
            "Action items fetched"
        );

        Ok(collection)
    }

    /// Consult the remaining-request quota before a repository's batch of
    /// calls. Below the low-water mark: warn. Below the critical mark: block
    /// until the quota resets, unless cancelled. A failed quota lookup is
    /// tolerated; cancellation is the only error path out of here.
    async fn check_rate_limit(&mut self) -> Result<()> {
        let state = match self.client.rate_limit().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Rate limit check failed, continuing anyway");
                return Ok(());
            }
        };

        if state.remaining < RATE_LIMIT_LOW_WATER {
            warn!(
                remaining = state.remaining,
                reset = %state.reset_at,
                "API rate limit running low"
            );

            if state.remaining < RATE_LIMIT_CRITICAL {
                let wait = (state.reset_at - Utc::now())
                    .to_std()
                    .unwrap_or_default()
                    + std::time::Duration::from_secs(1);
                info!(wait_secs = wait.as_secs(), "Waiting for rate limit reset");

                if !self.cancel.sleep(wait).await {
                    return Err(CollectionCancelled.into());
                }
            }
        }

        Ok(())
    }

    /// Issues/PRs last updated more than 30 days ago with no maintainer
    /// comment since the boundary.
    async fn fetch_old_items(&self, repo: &RepoKey) -> Result<Vec<ActivityItem>> {
        let thirty_days_ago = Utc::now() - Duration::days(30);
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self
                .client
                .list_issues(
                    repo,
                    IssueSort::Updated,
                    SortDirection::Ascending,
                    None,
                    page,
                )
                .await?;

            for issue in result.items {
                if issue.updated_at >= thirty_days_ago {
                    continue;
                }

                let has_activity = match self
                    .has_maintainer_activity(repo, issue.number, thirty_days_ago)
                    .await
                {
                    Ok(found) => found,
                    Err(e) => {
                        debug!(
                            repo = %repo,
                            number = issue.number,
                            error = %e,
                            "Failed to check maintainer activity, assuming none"
                        );
                        false
                    }
                };

                if !has_activity {
                    items.push(ActivityItem {
                        org: repo.org.clone(),
                        repo: repo.repo.clone(),
                        number: issue.number,
                        title: issue.title,
                        item_type: if issue.is_pull_request {
                            ItemType::Pr
                        } else {
                            ItemType::Issue
                        },
                        updated_at: issue.updated_at,
                        days_since_update: (Utc::now() - issue.updated_at).num_days(),
                    });
                }
            }
            // All pages are scanned here: stale items can shift position
            // between paginated calls, so no early termination.

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(items)
    }

    /// Count of items with no activity for 90+ days. The list is sorted
    /// ascending by update time, so counting stops at the first recent item.
    async fn fetch_backlog_count(&self, repo: &RepoKey) -> Result<i64> {
        let ninety_days_ago = Utc::now() - Duration::days(90);
        let mut count = 0i64;
        let mut page = 1u32;

        loop {
            let result = self
                .client
                .list_issues(
                    repo,
                    IssueSort::Updated,
                    SortDirection::Ascending,
                    None,
                    page,
                )
                .await?;

            for issue in result.items {
                if issue.updated_at < ninety_days_ago {
                    count += 1;
                } else {
                    return Ok(count);
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(count)
    }

    /// Non-PR issues created within the last 72 hours.
    async fn fetch_new_issues(&self, repo: &RepoKey) -> Result<Vec<NewIssue>> {
        let cutoff = Utc::now() - Duration::hours(72);
        let mut new_issues = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self
                .client
                .list_issues(
                    repo,
                    IssueSort::Created,
                    SortDirection::Descending,
                    Some(cutoff),
                    page,
                )
                .await?;

            for issue in result.items {
                if issue.is_pull_request {
                    continue;
                }
                if issue.created_at > cutoff {
                    new_issues.push(NewIssue {
                        org: repo.org.clone(),
                        repo: repo.repo.clone(),
                        number: issue.number,
                        title: issue.title,
                        created_at: issue.created_at,
                        labels: issue.labels,
                        assignees: issue.assignees,
                    });
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(new_issues)
    }

    /// Presence of ownership documentation and a README at the repo root.
    async fn fetch_ownership_status(&self, repo: &RepoKey) -> Result<RepoOwnership> {
        let mut status = RepoOwnership {
            org: repo.org.clone(),
            repo: repo.repo.clone(),
            has_owners: false,
            has_readme: false,
        };

        for filename in &self.ownership_files {
            if filename == "README.md" {
                continue;
            }
            match self.client.content_exists(repo, filename).await {
                Ok(true) => {
                    status.has_owners = true;
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    debug!(repo = %repo, file = %filename, error = %e, "Error checking ownership file");
                }
            }
        }

        match self.client.content_exists(repo, "README.md").await {
            Ok(exists) => status.has_readme = exists,
            Err(e) => {
                debug!(repo = %repo, error = %e, "Error checking README.md");
            }
        }

        Ok(status)
    }

    /// Non-PR issues older than the response threshold with zero maintainer
    /// comments since creation.
    async fn fetch_unresponded_issues(
        &self,
        repo: &RepoKey,
        response_hours: i64,
    ) -> Result<Vec<UnrespondedIssue>> {
        let cutoff = Utc::now() - Duration::hours(response_hours);
        let mut unresponded = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self
                .client
                .list_issues(
                    repo,
                    IssueSort::Created,
                    SortDirection::Ascending,
                    None,
                    page,
                )
                .await?;

            for issue in result.items {
                if issue.is_pull_request {
                    continue;
                }
                if issue.created_at > cutoff {
                    continue;
                }

                let has_response = match self
                    .has_maintainer_activity(repo, issue.number, issue.created_at)
                    .await
                {
                    Ok(found) => found,
                    Err(e) => {
                        debug!(repo = %repo, number = issue.number, error = %e, "Failed to check comments");
                        continue;
                    }
                };

                if !has_response {
                    unresponded.push(UnrespondedIssue {
                        url: repo.issue_url(issue.number),
                        org: repo.org.clone(),
                        repo: repo.repo.clone(),
                        number: issue.number,
                        title: issue.title,
                        author: issue.author,
                        created_at: issue.created_at,
                        days_since: (Utc::now() - issue.created_at).num_days(),
                        labels: issue.labels,
                    });
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(unresponded)
    }

    /// Non-draft PRs older than the review threshold with zero reviews of
    /// any kind.
    async fn fetch_unreviewed_prs(
        &self,
        repo: &RepoKey,
        review_hours: i64,
    ) -> Result<Vec<UnreviewedPr>> {
        let cutoff = Utc::now() - Duration::hours(review_hours);
        let mut unreviewed = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self.client.list_pulls(repo, page).await?;

            for pr in result.items {
                if pr.created_at > cutoff || pr.draft {
                    continue;
                }

                let reviews = match self.client.list_reviews(repo, pr.number, 1).await {
                    Ok(reviews) => reviews,
                    Err(e) => {
                        debug!(repo = %repo, number = pr.number, error = %e, "Failed to check reviews");
                        continue;
                    }
                };

                if reviews.items.is_empty() {
                    unreviewed.push(UnreviewedPr {
                        url: repo.pull_url(pr.number),
                        org: repo.org.clone(),
                        repo: repo.repo.clone(),
                        number: pr.number,
                        title: pr.title,
                        author: pr.author,
                        created_at: pr.created_at,
                        days_since: (Utc::now() - pr.created_at).num_days(),
                        is_draft: pr.draft,
                    });
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(unreviewed)
    }

    /// Whether the default branch's combined status is failing.
    async fn fetch_failing_branches(&self, repo: &RepoKey) -> Result<Vec<FailingBranch>> {
        let info = self.client.get_repo(repo).await?;
        let branch = if info.default_branch.is_empty() {
            "main".to_string()
        } else {
            info.default_branch
        };

        let status = self.client.combined_status(repo, &branch).await?;

        let mut failing = Vec::new();
        if status.state == "failure" || status.state == "error" {
            failing.push(FailingBranch {
                url: format!("https://github.com/{}/tree/{}", repo, branch),
                checks_url: format!("https://github.com/{}/commits/{}", repo, branch),
                org: repo.org.clone(),
                repo: repo.repo.clone(),
                branch,
                status: status.state,
            });
        }

        Ok(failing)
    }

    /// Non-draft PRs with at least one approval, no requested changes,
    /// passing (or unknown) CI, and no merge conflicts.
    async fn fetch_approved_prs_ready_to_merge(&self, repo: &RepoKey) -> Result<Vec<ApprovedPr>> {
        let mut approved_prs = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self.client.list_pulls(repo, page).await?;

            for pr in result.items {
                if pr.draft {
                    continue;
                }

                let reviews = match self.all_reviews(repo, pr.number).await {
                    Ok(reviews) => reviews,
                    Err(e) => {
                        debug!(repo = %repo, number = pr.number, error = %e, "Failed to check reviews");
                        continue;
                    }
                };

                let mut approval_count = 0;
                let mut has_requested_changes = false;
                let mut last_approval: Option<DateTime<Utc>> = None;

                for review in &reviews {
                    match review.verdict {
                        ReviewVerdict::Approved => {
                            approval_count += 1;
                            if let Some(at) = review.submitted_at {
                                if last_approval.map(|prev| at > prev).unwrap_or(true) {
                                    last_approval = Some(at);
                                }
                            }
                        }
                        ReviewVerdict::ChangesRequested => has_requested_changes = true,
                        ReviewVerdict::Other => {}
                    }
                }

                if approval_count == 0 || has_requested_changes {
                    continue;
                }

                // CI lookup failure does not exclude the PR; a maintainer can
                // verify manually.
                match self.client.combined_status(repo, &pr.head_sha).await {
                    Ok(status) => {
                        if status.state != "success" && !status.state.is_empty() {
                            continue;
                        }
                    }
                    Err(e) => {
                        debug!(repo = %repo, number = pr.number, error = %e, "Failed to check CI status");
                    }
                }

                if pr.mergeable == Some(false) {
                    continue;
                }

                approved_prs.push(ApprovedPr {
                    url: repo.pull_url(pr.number),
                    org: repo.org.clone(),
                    repo: repo.repo.clone(),
                    number: pr.number,
                    title: pr.title,
                    author: pr.author,
                    approved_at: last_approval,
                    days_since: last_approval
                        .map(|at| (Utc::now() - at).num_days())
                        .unwrap_or(0),
                    approval_count,
                });
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(approved_prs)
    }

    /// Non-draft PRs authored by someone without admin/maintain permission.
    async fn fetch_external_contributor_prs(
        &self,
        repo: &RepoKey,
    ) -> Result<Vec<ExternalContributorPr>> {
        let mut external_prs = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self.client.list_pulls(repo, page).await?;

            for pr in result.items {
                if pr.draft || pr.author.is_empty() {
                    continue;
                }

                let is_maintainer = match self.is_maintainer(repo, &pr.author).await {
                    Ok(found) => found,
                    Err(e) => {
                        debug!(repo = %repo, author = %pr.author, error = %e, "Failed to check maintainer status");
                        continue;
                    }
                };
                if is_maintainer {
                    continue;
                }

                // First-time contributor: no prior merged PR in this repo.
                // A failed search just means we don't claim first-time.
                let is_first_time = match self
                    .client
                    .count_merged_prs_by_author(repo, &pr.author)
                    .await
                {
                    Ok(0) => true,
                    Ok(_) => false,
                    Err(_) => false,
                };

                external_prs.push(ExternalContributorPr {
                    url: repo.pull_url(pr.number),
                    org: repo.org.clone(),
                    repo: repo.repo.clone(),
                    number: pr.number,
                    title: pr.title,
                    author: pr.author,
                    created_at: pr.created_at,
                    days_waiting: (Utc::now() - pr.created_at).num_days(),
                    is_first_time,
                });
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(external_prs)
    }

    /// Non-draft PRs whose latest CHANGES_REQUESTED review is older than the
    /// threshold with no commit or author comment after it.
    async fn fetch_prs_awaiting_author_response(
        &self,
        repo: &RepoKey,
        days_threshold: i64,
    ) -> Result<Vec<PrAwaitingAuthor>> {
        let cutoff = Utc::now() - Duration::days(days_threshold);
        let mut awaiting_prs = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self.client.list_pulls(repo, page).await?;

            for pr in result.items {
                if pr.draft {
                    continue;
                }

                let reviews = match self.all_reviews(repo, pr.number).await {
                    Ok(reviews) => reviews,
                    Err(e) => {
                        debug!(repo = %repo, number = pr.number, error = %e, "Failed to check reviews");
                        continue;
                    }
                };

                let latest_change_request = reviews
                    .iter()
                    .filter(|r| r.verdict == ReviewVerdict::ChangesRequested)
                    .filter_map(|r| r.submitted_at.map(|at| (r, at)))
                    .max_by_key(|(_, at)| *at);

                let Some((change_request, requested_at)) = latest_change_request else {
                    continue;
                };

                if requested_at > cutoff {
                    continue;
                }

                if self
                    .author_responded_after(repo, &pr.author, pr.number, requested_at)
                    .await
                {
                    continue;
                }

                awaiting_prs.push(PrAwaitingAuthor {
                    url: repo.pull_url(pr.number),
                    org: repo.org.clone(),
                    repo: repo.repo.clone(),
                    number: pr.number,
                    title: pr.title,
                    author: pr.author,
                    reviewer: change_request.author.clone(),
                    requested_at,
                    days_since_request: (Utc::now() - requested_at).num_days(),
                });
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(awaiting_prs)
    }

    /// A commit or an author comment after the change request counts as a
    /// response. Lookup failures are treated as "no response seen".
    async fn author_responded_after(
        &self,
        repo: &RepoKey,
        author: &str,
        number: u64,
        since: DateTime<Utc>,
    ) -> bool {
        let mut page = 1u32;
        loop {
            match self.client.list_pull_commits(repo, number, page).await {
                Ok(result) => {
                    for commit in &result.items {
                        if commit.authored_at.map(|at| at > since).unwrap_or(false) {
                            return true;
                        }
                    }
                    match result.next_page {
                        Some(next) => page = next,
                        None => break,
                    }
                }
                Err(_) => break,
            }
        }

        let mut page = 1u32;
        loop {
            match self
                .client
                .list_issue_comments(repo, number, Some(since), page)
                .await
            {
                Ok(result) => {
                    if result.items.iter().any(|c| c.author == author) {
                        return true;
                    }
                    match result.next_page {
                        Some(next) => page = next,
                        None => break,
                    }
                }
                Err(_) => break,
            }
        }

        false
    }

    /// Whether a maintainer commented on the item since the cutoff.
    async fn has_maintainer_activity(
        &self,
        repo: &RepoKey,
        number: u64,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let mut page = 1u32;

        loop {
            let result = self
                .client
                .list_issue_comments(repo, number, Some(since), page)
                .await?;

            for comment in result.items {
                let is_maintainer = match self.is_maintainer(repo, &comment.author).await {
                    Ok(found) => found,
                    Err(e) => {
                        debug!(user = %comment.author, error = %e, "Failed to check collaborator status");
                        continue;
                    }
                };
                if is_maintainer {
                    return Ok(true);
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(false)
    }

    /// admin or maintain counts as maintainer; write does not.
    async fn is_maintainer(&self, repo: &RepoKey, username: &str) -> Result<bool> {
        let permission = self.client.permission_level(repo, username).await?;
        Ok(permission == "admin" || permission == "maintain")
    }

    async fn all_reviews(&self, repo: &RepoKey, number: u64) -> Result<Vec<ReviewData>> {
        let mut reviews = Vec::new();
        let mut page = 1u32;
        loop {
            let result = self.client.list_reviews(repo, number, page).await?;
            reviews.extend(result.items);
            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(reviews)
    }
}

impl GoalsCollection {
    fn skip(&mut self, repo: &RepoKey, signal: Signal, err: Box<dyn std::error::Error + Send + Sync>) {
        warn!(repo = %repo, signal = %signal, error = %err, "Failed to fetch signal, skipping");
        self.skipped.push(SkippedSignal {
            repo: repo.clone(),
            signal,
            reason: err.to_string(),
        });
    }
}

impl ActionCollection {
    fn skip(&mut self, repo: &RepoKey, signal: Signal, err: Box<dyn std::error::Error + Send + Sync>) {
        warn!(repo = %repo, signal = %signal, error = %err, "Failed to fetch signal, skipping");
        self.skipped.push(SkippedSignal {
            repo: repo.clone(),
            signal,
            reason: err.to_string(),
        });
    }
}
