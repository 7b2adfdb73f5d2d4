pub mod client;

pub use client::GithubApi;

use crate::models::{RepoKey, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Every list operation runs at this page size.
pub const PAGE_SIZE: u8 = 100;

/// One page of a paginated list call. `next_page` is `None` once the API
/// reports no further page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSort {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// An issue as returned by the issues list endpoint. Pull requests show up
/// here too, flagged with `is_pull_request`.
#[derive(Debug, Clone)]
pub struct IssueData {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub is_pull_request: bool,
}

#[derive(Debug, Clone)]
pub struct PullData {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub draft: bool,
    pub head_sha: String,
    /// `None` when GitHub has not computed mergeability yet.
    pub mergeable: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    ChangesRequested,
    Other,
}

#[derive(Debug, Clone)]
pub struct ReviewData {
    pub verdict: ReviewVerdict,
    pub author: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CommitData {
    pub authored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CommentData {
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Combined commit status for a ref. `state` is one of `success`, `failure`,
/// `error`, `pending`, or empty when no statuses are reported.
#[derive(Debug, Clone)]
pub struct CombinedStatus {
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub default_branch: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// The hosting-API capability the collector is built against. The production
/// implementation wraps octocrab; tests script their own.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn list_issues(
        &self,
        repo: &RepoKey,
        sort: IssueSort,
        direction: SortDirection,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<IssueData>>;

    async fn list_pulls(&self, repo: &RepoKey, page: u32) -> Result<Page<PullData>>;

    async fn list_reviews(
        &self,
        repo: &RepoKey,
        number: u64,
        page: u32,
    ) -> Result<Page<ReviewData>>;

    async fn list_pull_commits(
        &self,
        repo: &RepoKey,
        number: u64,
        page: u32,
    ) -> Result<Page<CommitData>>;

    async fn list_issue_comments(
        &self,
        repo: &RepoKey,
        number: u64,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<CommentData>>;

    async fn get_repo(&self, repo: &RepoKey) -> Result<RepoInfo>;

    async fn combined_status(&self, repo: &RepoKey, git_ref: &str) -> Result<CombinedStatus>;

    /// Whether a file exists at the repository root. 404 maps to `Ok(false)`;
    /// other failures surface as errors.
    async fn content_exists(&self, repo: &RepoKey, path: &str) -> Result<bool>;

    /// Permission level for a user: `admin`, `maintain`, `write`, `read`,
    /// or `none`.
    async fn permission_level(&self, repo: &RepoKey, username: &str) -> Result<String>;

    async fn rate_limit(&self) -> Result<RateLimitState>;

    /// Number of merged PRs a given author has in the repository.
    async fn count_merged_prs_by_author(&self, repo: &RepoKey, author: &str) -> Result<u64>;
}
