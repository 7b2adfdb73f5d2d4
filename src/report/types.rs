use crate::goals::{ActionItems, GoalsProgress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Snapshots from both dashboard archives, keyed by date string (YYYY-MM-DD),
/// plus the union of dates sorted newest first.
#[derive(Debug, Default)]
pub struct HistoricalData {
    pub community_health: HashMap<String, CommunityHealthSnapshot>,
    pub stale: HashMap<String, StaleSnapshot>,
    pub available_dates: Vec<String>,
}

/// One daily document from the community-health dashboard archive. Field
/// names follow the dashboard's JSON, which is camelCase.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommunityHealthSnapshot {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "repositories", default)]
    pub repos: Vec<CommunityRepoData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommunityRepoData {
    pub org: String,
    pub repo: String,
    #[serde(default)]
    pub contributors: i64,
    #[serde(rename = "contributorsList", default)]
    pub contributors_list: Vec<String>,
    #[serde(rename = "newContributors", default)]
    pub new_contributors: i64,
    #[serde(rename = "newContributorsList", default)]
    pub new_contributors_list: Vec<String>,
    #[serde(rename = "avgIssueResponseMs", default)]
    pub avg_issue_response_ms: f64,
    #[serde(rename = "avgPRResponseMs", default)]
    pub avg_pr_response_ms: f64,
    #[serde(rename = "prMergeRate", default)]
    pub pr_merge_rate: f64,
    #[serde(rename = "openIssues", default)]
    pub open_issues: i64,
    #[serde(rename = "openPRs", default)]
    pub open_prs: i64,
    #[serde(default)]
    pub coverage: Option<f64>,
    #[serde(rename = "snykVulnerabilities", default)]
    pub snyk_vulnerabilities: Option<SnykVulnerabilities>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnykVulnerabilities {
    #[serde(default)]
    pub critical: i64,
    #[serde(default)]
    pub high: i64,
    #[serde(default)]
    pub medium: i64,
    #[serde(default)]
    pub low: i64,
    #[serde(default)]
    pub total: i64,
}

/// One daily document from the stale dashboard archive.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaleSnapshot {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "totalStale", default)]
    pub total_stale: i64,
    #[serde(rename = "staleIssues", default)]
    pub stale_issues: i64,
    #[serde(rename = "stalePRs", default)]
    pub stale_prs: i64,
    #[serde(rename = "repositories", default)]
    pub repos: Vec<StaleRepoData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaleRepoData {
    pub org: String,
    pub repo: String,
    #[serde(rename = "totalStale", default)]
    pub total_stale: i64,
    #[serde(rename = "staleIssues", default)]
    pub stale_issues: i64,
    #[serde(rename = "stalePRs", default)]
    pub stale_prs: i64,
    #[serde(default)]
    pub items: Vec<StaleItem>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaleItem {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    /// "issue" or "pr".
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// The complete payload for one maintainer's weekly email.
#[derive(Debug, Clone, Default)]
pub struct EmailReport {
    pub maintainer_name: String,
    pub repos: Vec<RepoReport>,
    /// Date of the newest snapshot, YYYY-MM-DD.
    pub week_ending: String,
    pub generated_at: DateTime<Utc>,

    pub total_stale: i64,
    pub total_repos: usize,
    pub total_new_contributors: usize,

    pub goals_progress: Option<GoalsProgress>,
}

/// Weekly data for one repository.
#[derive(Debug, Clone, Default)]
pub struct RepoReport {
    pub org: String,
    pub repo: String,

    pub current_stale: StaleMetrics,
    pub previous_stale: StaleMetrics,
    pub stale_trend: TrendMetrics,
    pub stale_items: Vec<StaleItem>,

    pub current_health: HealthMetrics,
    pub previous_health: HealthMetrics,
    pub health_trend: TrendMetrics,

    pub new_contributors: Vec<Contributor>,

    pub action_items: Option<ActionItems>,

    pub dashboard_url: String,
    pub stale_url: String,
    pub community_health_url: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StaleMetrics {
    pub total_stale: i64,
    pub stale_issues: i64,
    pub stale_prs: i64,
}

#[derive(Debug, Clone, Default)]
pub struct HealthMetrics {
    pub contributors: i64,
    pub new_contributors: i64,
    pub avg_issue_response_ms: f64,
    pub avg_pr_response_ms: f64,
    pub pr_merge_rate: f64,
    pub open_issues: i64,
    pub open_prs: i64,
    pub coverage: Option<f64>,
    pub vulnerabilities: Option<SnykVulnerabilities>,
}

#[derive(Debug, Clone)]
pub struct Contributor {
    pub username: String,
}

/// Week-over-week change for a single counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub absolute: i64,
    pub percent: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Same,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Same => "same",
        };
        write!(f, "{}", s)
    }
}

/// The payload for the team-wide summary email sent to CC recipients.
#[derive(Debug, Clone, Default)]
pub struct SummaryEmailReport {
    pub week_ending: String,
    pub generated_at: DateTime<Utc>,
    pub maintainers: Vec<MaintainerSummary>,

    pub total_maintainers: usize,
    pub total_repos: usize,
    pub total_stale_items: i64,
    pub total_new_contributors: usize,
    pub total_open_issues: i64,
    pub total_open_prs: i64,

    pub goals_progress: Option<GoalsProgress>,
    pub top_unresponded_issues: Vec<crate::goals::types::UnrespondedIssue>,
    pub top_unreviewed_prs: Vec<crate::goals::types::UnreviewedPr>,
}

#[derive(Debug, Clone)]
pub struct MaintainerSummary {
    pub name: String,
    pub email: String,
    pub repo_count: usize,
    pub repositories: Vec<String>,
    pub stale_items: i64,
}
