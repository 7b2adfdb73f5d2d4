use super::types::*;
use crate::goals::types::{UnrespondedIssue, UnreviewedPr};
use crate::goals::GoalsProgress;
use std::collections::HashMap;

const TOP_N: usize = 10;

/// Roll every maintainer report into one team-wide summary. Maintainers are
/// listed most-stale first.
pub fn generate_summary_report(
    reports: &HashMap<String, EmailReport>,
    goals_progress: Option<GoalsProgress>,
) -> SummaryEmailReport {
    let mut summary = SummaryEmailReport {
        generated_at: chrono::Utc::now(),
        ..Default::default()
    };
    let has_goals = goals_progress.is_some();
    summary.goals_progress = goals_progress;

    for (email, report) in reports {
        if summary.week_ending.is_empty() {
            summary.week_ending = report.week_ending.clone();
        }

        let repo_list: Vec<String> = report
            .repos
            .iter()
            .map(|repo| format!("{}/{}", repo.org, repo.repo))
            .collect();

        summary.maintainers.push(MaintainerSummary {
            name: report.maintainer_name.clone(),
            email: email.clone(),
            repo_count: report.repos.len(),
            repositories: repo_list,
            stale_items: report.total_stale,
        });

        summary.total_repos += report.total_repos;
        summary.total_stale_items += report.total_stale;
        summary.total_new_contributors += report.total_new_contributors;

        for repo in &report.repos {
            summary.total_open_issues += repo.current_health.open_issues;
            summary.total_open_prs += repo.current_health.open_prs;
        }
    }

    summary.total_maintainers = reports.len();

    summary
        .maintainers
        .sort_by(|a, b| b.stale_items.cmp(&a.stale_items));

    if has_goals {
        summary.top_unresponded_issues = collect_top_unresponded_issues(reports, TOP_N);
        summary.top_unreviewed_prs = collect_top_unreviewed_prs(reports, TOP_N);
    }

    summary
}

fn collect_top_unresponded_issues(
    reports: &HashMap<String, EmailReport>,
    limit: usize,
) -> Vec<UnrespondedIssue> {
    let mut all_issues: Vec<UnrespondedIssue> = reports
        .values()
        .flat_map(|report| report.repos.iter())
        .filter_map(|repo| repo.action_items.as_ref())
        .flat_map(|items| items.unresponded_issues.iter().cloned())
        .collect();

    all_issues.sort_by(|a, b| b.days_since.cmp(&a.days_since));
    all_issues.truncate(limit);
    all_issues
}

fn collect_top_unreviewed_prs(
    reports: &HashMap<String, EmailReport>,
    limit: usize,
) -> Vec<UnreviewedPr> {
    let mut all_prs: Vec<UnreviewedPr> = reports
        .values()
        .flat_map(|report| report.repos.iter())
        .filter_map(|repo| repo.action_items.as_ref())
        .flat_map(|items| items.unreviewed_prs.iter().cloned())
        .collect();

    all_prs.sort_by(|a, b| b.days_since.cmp(&a.days_since));
    all_prs.truncate(limit);
    all_prs
}
