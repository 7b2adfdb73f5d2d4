use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status classification shared by all goal metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    Critical,
    NeedsAttention,
    OnTrack,
}

impl GoalStatus {
    /// 90%+ = on-track, 70-89% = needs-attention, below = critical.
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 90.0 {
            GoalStatus::OnTrack
        } else if rate >= 70.0 {
            GoalStatus::NeedsAttention
        } else {
            GoalStatus::Critical
        }
    }

    /// Backlog uses a reduction target instead of the fixed bands, with a
    /// 75%-of-target needs-attention band.
    pub fn from_backlog_reduction(reduction: f64, target: f64) -> Self {
        if reduction >= target {
            GoalStatus::OnTrack
        } else if reduction >= target * 0.75 {
            GoalStatus::NeedsAttention
        } else {
            GoalStatus::Critical
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalStatus::OnTrack => "on-track",
            GoalStatus::NeedsAttention => "needs-attention",
            GoalStatus::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Raw data fetched from the hosting API, before any compliance math.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGoalsData {
    pub activity_items: Vec<ActivityItem>,
    pub backlog_count: i64,
    pub new_issues: Vec<NewIssue>,
    pub ownership_status: Vec<RepoOwnership>,
}

/// An issue/PR that has been inactive past the 30-day boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityItem {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub item_type: ItemType,
    pub updated_at: DateTime<Utc>,
    pub days_since_update: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Issue,
    Pr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwnership {
    pub org: String,
    pub repo: String,
    pub has_owners: bool,
    pub has_readme: bool,
}

/// Overall progress on all 4 goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsProgress {
    pub thirty_day_activity: ActivityGoalMetrics,
    pub backlog_cleanup: BacklogGoalMetrics,
    pub triage_speed: TriageGoalMetrics,
    pub ownership_updates: OwnershipGoalMetrics,

    pub per_repo_metrics: Vec<RepoGoalMetrics>,

    pub fetched_at: DateTime<Utc>,
    pub total_repos_checked: usize,
}

/// Goal 1: 30-Day Activity Rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityGoalMetrics {
    pub total_open_items: usize,
    pub items_over_30_days: usize,
    pub compliance_rate: f64,
    pub status: GoalStatus,
    pub worst_offenders: Vec<StaleActivityItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleActivityItem {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub item_type: ItemType,
    pub days_since_update: i64,
    pub url: String,
}

/// Goal 2: Backlog Cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogGoalMetrics {
    pub current_backlog: i64,
    pub baseline: i64,
    pub baseline_date: String,
    pub items_reduced: i64,
    pub reduction_percent: f64,
    pub target: f64,
    pub status: GoalStatus,
    pub time_remaining: String,
}

/// Goal 3: Triage Speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageGoalMetrics {
    pub new_issues_last_72h: usize,
    pub triaged_issues: usize,
    pub untriaged_issues: usize,
    pub triage_rate: f64,
    pub status: GoalStatus,
    pub untriaged_list: Vec<UntriagedIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UntriagedIssue {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub hours_open: i64,
    pub missing_label: bool,
    pub missing_assignee: bool,
    pub url: String,
}

/// Goal 4: Ownership Files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipGoalMetrics {
    pub total_repos: usize,
    pub repos_with_files: usize,
    pub repos_missing_files: usize,
    pub compliance_rate: f64,
    pub status: GoalStatus,
    pub repos_needing_attention: Vec<OwnershipRepoStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipRepoStatus {
    pub org: String,
    pub repo: String,
    pub has_owners: bool,
    pub has_readme: bool,
    pub url: String,
}

/// Goal metrics scoped to a single repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoGoalMetrics {
    pub org: String,
    pub repo: String,

    pub activity_compliance: f64,
    pub items_over_30_days: usize,
    pub total_open_items: usize,

    pub backlog_count: i64,

    pub triage_rate: f64,
    pub new_issues_last_72h: usize,
    pub untriaged_count: usize,

    pub has_owners: bool,
    pub has_readme: bool,

    /// Worst of the per-repo dimensions.
    pub overall_status: Option<GoalStatus>,
}

/// Immediate action items for maintainers, distinct from longer-horizon goal
/// compliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionItems {
    pub unresponded_issues: Vec<UnrespondedIssue>,
    pub unreviewed_prs: Vec<UnreviewedPr>,
    pub failing_branches: Vec<FailingBranch>,
    pub approved_prs_ready_to_merge: Vec<ApprovedPr>,
    pub external_contributor_prs: Vec<ExternalContributorPr>,
    pub prs_awaiting_author_response: Vec<PrAwaitingAuthor>,

    pub total_items: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub total_checked: usize,
}

impl ActionItems {
    pub fn recount(&mut self) {
        self.total_items = self.unresponded_issues.len()
            + self.unreviewed_prs.len()
            + self.failing_branches.len()
            + self.approved_prs_ready_to_merge.len()
            + self.external_contributor_prs.len()
            + self.prs_awaiting_author_response.len();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnrespondedIssue {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub days_since: i64,
    pub url: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreviewedPr {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub days_since: i64,
    pub url: String,
    pub is_draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailingBranch {
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub status: String,
    pub url: String,
    pub checks_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedPr {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub days_since: i64,
    pub approval_count: usize,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalContributorPr {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub days_waiting: i64,
    pub is_first_time: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrAwaitingAuthor {
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub reviewer: String,
    pub requested_at: DateTime<Utc>,
    pub days_since_request: i64,
    pub url: String,
}
