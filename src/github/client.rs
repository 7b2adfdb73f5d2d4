use super::{
    CombinedStatus, CommentData, CommitData, HostingApi, IssueData, IssueSort, Page, PullData,
    RateLimitState, RepoInfo, ReviewData, ReviewVerdict, SortDirection, PAGE_SIZE,
};
use crate::models::{RepoKey, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::warn;

/// Production `HostingApi` backed by octocrab.
pub struct GithubApi {
    client: Octocrab,
}

impl GithubApi {
    /// Build from `GITHUB_TOKEN` if present, anonymous otherwise.
    pub fn from_env() -> Result<Self> {
        let client = match std::env::var("GITHUB_TOKEN") {
            Ok(token) => Octocrab::builder().personal_token(token).build()?,
            Err(_) => {
                warn!("No GITHUB_TOKEN found, using unauthenticated client");
                Octocrab::builder().build()?
            }
        };
        Ok(Self { client })
    }

    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

fn next_page_number<T>(page: &octocrab::Page<T>, current: u32) -> Option<u32> {
    page.next.as_ref().map(|_| current + 1)
}

/// Page number for raw-route calls without Link-header access: a short page
/// means there is nothing further to request.
fn next_page_by_len(len: usize, current: u32) -> Option<u32> {
    if len == usize::from(PAGE_SIZE) {
        Some(current + 1)
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct PullCommitWire {
    commit: CommitDetailWire,
}

#[derive(Debug, Deserialize)]
struct CommitDetailWire {
    author: Option<GitUserWire>,
}

#[derive(Debug, Deserialize)]
struct GitUserWire {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CombinedStatusWire {
    state: String,
}

#[derive(Debug, Deserialize)]
struct PermissionWire {
    permission: String,
}

#[async_trait]
impl HostingApi for GithubApi {
    async fn list_issues(
        &self,
        repo: &RepoKey,
        sort: IssueSort,
        direction: SortDirection,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<IssueData>> {
        let issues = self.client.issues(&repo.org, &repo.repo);
        let mut builder = issues
            .list()
            .state(octocrab::params::State::Open)
            .sort(match sort {
                IssueSort::Created => octocrab::params::issues::Sort::Created,
                IssueSort::Updated => octocrab::params::issues::Sort::Updated,
            })
            .direction(match direction {
                SortDirection::Ascending => octocrab::params::Direction::Ascending,
                SortDirection::Descending => octocrab::params::Direction::Descending,
            })
            .per_page(PAGE_SIZE)
            .page(page);

        if let Some(since) = since {
            builder = builder.since(since);
        }

        let result = builder.send().await?;
        let next_page = next_page_number(&result, page);
        let items = result
            .into_iter()
            .map(|issue| IssueData {
                number: issue.number,
                title: issue.title,
                author: issue.user.login,
                created_at: issue.created_at,
                updated_at: issue.updated_at,
                labels: issue.labels.into_iter().map(|l| l.name).collect(),
                assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
                is_pull_request: issue.pull_request.is_some(),
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn list_pulls(&self, repo: &RepoKey, page: u32) -> Result<Page<PullData>> {
        let result = self
            .client
            .pulls(&repo.org, &repo.repo)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Created)
            .direction(octocrab::params::Direction::Ascending)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await?;

        let next_page = next_page_number(&result, page);
        let items = result
            .into_iter()
            .map(|pr| PullData {
                number: pr.number,
                title: pr.title.unwrap_or_default(),
                author: pr.user.map(|u| u.login).unwrap_or_default(),
                created_at: pr.created_at.unwrap_or_else(Utc::now),
                draft: pr.draft.unwrap_or(false),
                head_sha: pr.head.sha,
                mergeable: pr.mergeable,
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn list_reviews(
        &self,
        repo: &RepoKey,
        number: u64,
        page: u32,
    ) -> Result<Page<ReviewData>> {
        let result = self
            .client
            .pulls(&repo.org, &repo.repo)
            .list_reviews(number)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await?;

        let next_page = next_page_number(&result, page);
        let items = result
            .into_iter()
            .map(|review| ReviewData {
                verdict: match review.state {
                    Some(octocrab::models::pulls::ReviewState::Approved) => {
                        ReviewVerdict::Approved
                    }
                    Some(octocrab::models::pulls::ReviewState::ChangesRequested) => {
                        ReviewVerdict::ChangesRequested
                    }
                    _ => ReviewVerdict::Other,
                },
                author: review.user.map(|u| u.login).unwrap_or_default(),
                submitted_at: review.submitted_at,
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn list_pull_commits(
        &self,
        repo: &RepoKey,
        number: u64,
        page: u32,
    ) -> Result<Page<CommitData>> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/commits",
            repo.org, repo.repo, number
        );
        let commits: Vec<PullCommitWire> = self
            .client
            .get(
                route,
                Some(&[
                    ("per_page", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ]),
            )
            .await?;

        let next_page = next_page_by_len(commits.len(), page);
        let items = commits
            .into_iter()
            .map(|c| CommitData {
                authored_at: c.commit.author.and_then(|a| a.date),
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoKey,
        number: u64,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<CommentData>> {
        let issues = self.client.issues(&repo.org, &repo.repo);
        let mut builder = issues
            .list_comments(number)
            .per_page(PAGE_SIZE)
            .page(page);

        if let Some(since) = since {
            builder = builder.since(since);
        }

        let result = builder.send().await?;
        let next_page = next_page_number(&result, page);
        let items = result
            .into_iter()
            .map(|comment| CommentData {
                author: comment.user.login,
                created_at: comment.created_at,
            })
            .collect();

        Ok(Page { items, next_page })
    }

    async fn get_repo(&self, repo: &RepoKey) -> Result<RepoInfo> {
        let repository = self.client.repos(&repo.org, &repo.repo).get().await?;
        Ok(RepoInfo {
            default_branch: repository
                .default_branch
                .unwrap_or_else(|| "main".to_string()),
        })
    }

    async fn combined_status(&self, repo: &RepoKey, git_ref: &str) -> Result<CombinedStatus> {
        let route = format!(
            "/repos/{}/{}/commits/{}/status",
            repo.org, repo.repo, git_ref
        );
        let status: CombinedStatusWire = self.client.get(route, None::<&()>).await?;
        Ok(CombinedStatus {
            state: status.state,
        })
    }

    async fn content_exists(&self, repo: &RepoKey, path: &str) -> Result<bool> {
        let result = self
            .client
            .repos(&repo.org, &repo.repo)
            .get_content()
            .path(path)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn permission_level(&self, repo: &RepoKey, username: &str) -> Result<String> {
        let route = format!(
            "/repos/{}/{}/collaborators/{}/permission",
            repo.org, repo.repo, username
        );
        let perm: PermissionWire = self.client.get(route, None::<&()>).await?;
        Ok(perm.permission)
    }

    async fn rate_limit(&self) -> Result<RateLimitState> {
        let limits = self.client.ratelimit().get().await?;
        let reset_at = DateTime::from_timestamp(limits.rate.reset as i64, 0)
            .unwrap_or_else(Utc::now);
        Ok(RateLimitState {
            remaining: limits.rate.remaining as u64,
            reset_at,
        })
    }

    async fn count_merged_prs_by_author(&self, repo: &RepoKey, author: &str) -> Result<u64> {
        let query = format!("type:pr repo:{} author:{} is:merged", repo, author);
        let result = self
            .client
            .search()
            .issues_and_pull_requests(&query)
            .per_page(1)
            .send()
            .await?;
        Ok(result.total_count.unwrap_or(0))
    }
}
