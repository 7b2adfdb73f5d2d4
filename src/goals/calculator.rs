use super::types::*;
use crate::config::GoalsConfig;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;

const BACKLOG_REDUCTION_TARGET: f64 = 20.0;
const TOP_N: usize = 10;

/// Pure transformation of raw collected counts into goal metrics. No I/O.
#[derive(Debug, Clone)]
pub struct Calculator {
    baseline: i64,
    baseline_date: String,
}

impl Calculator {
    pub fn new(goals_config: &GoalsConfig) -> Self {
        Self {
            baseline: goals_config.backlog_baseline,
            baseline_date: goals_config.backlog_baseline_date.clone(),
        }
    }

    pub fn calculate_goals_progress(
        &self,
        data: &RawGoalsData,
        total_repos: usize,
    ) -> GoalsProgress {
        GoalsProgress {
            thirty_day_activity: self.calculate_activity_goal(data),
            backlog_cleanup: self.calculate_backlog_goal(data.backlog_count),
            triage_speed: calculate_triage_goal(&data.new_issues),
            ownership_updates: calculate_ownership_goal(&data.ownership_status),
            per_repo_metrics: calculate_per_repo_metrics(data),
            fetched_at: Utc::now(),
            total_repos_checked: total_repos,
        }
    }

    /// Goal 1: 30-Day Activity Rule.
    fn calculate_activity_goal(&self, data: &RawGoalsData) -> ActivityGoalMetrics {
        let items = &data.activity_items;

        // Total open items = stale items plus new issues not already stale.
        let mut total_open = items.len();
        for new_issue in &data.new_issues {
            let already_counted = items.iter().any(|item| {
                item.org == new_issue.org
                    && item.repo == new_issue.repo
                    && item.number == new_issue.number
            });
            if !already_counted {
                total_open += 1;
            }
        }

        let items_over_30 = items.len();
        let compliance_rate = if total_open > 0 {
            (total_open - items_over_30) as f64 / total_open as f64 * 100.0
        } else {
            100.0
        };

        let mut sorted_items = items.clone();
        sorted_items.sort_by(|a, b| b.days_since_update.cmp(&a.days_since_update));

        let worst_offenders = sorted_items
            .into_iter()
            .take(TOP_N)
            .map(|item| {
                let segment = match item.item_type {
                    ItemType::Pr => "pull",
                    ItemType::Issue => "issues",
                };
                StaleActivityItem {
                    url: format!(
                        "https://github.com/{}/{}/{}/{}",
                        item.org, item.repo, segment, item.number
                    ),
                    org: item.org,
                    repo: item.repo,
                    number: item.number,
                    title: item.title,
                    item_type: item.item_type,
                    days_since_update: item.days_since_update,
                }
            })
            .collect();

        ActivityGoalMetrics {
            total_open_items: total_open,
            items_over_30_days: items_over_30,
            compliance_rate,
            status: GoalStatus::from_rate(compliance_rate),
            worst_offenders,
        }
    }

    /// Goal 2: Backlog Cleanup, measured against the configured baseline.
    fn calculate_backlog_goal(&self, current_count: i64) -> BacklogGoalMetrics {
        let items_reduced = self.baseline - current_count;
        let reduction_percent = if self.baseline > 0 {
            items_reduced as f64 / self.baseline as f64 * 100.0
        } else {
            0.0
        };

        BacklogGoalMetrics {
            current_backlog: current_count,
            baseline: self.baseline,
            baseline_date: self.baseline_date.clone(),
            items_reduced,
            reduction_percent,
            target: BACKLOG_REDUCTION_TARGET,
            status: GoalStatus::from_backlog_reduction(reduction_percent, BACKLOG_REDUCTION_TARGET),
            time_remaining: calculate_time_remaining(&self.baseline_date),
        }
    }
}

/// Goal 3: Triage Speed. Triaged = at least one label AND one assignee.
fn calculate_triage_goal(issues: &[NewIssue]) -> TriageGoalMetrics {
    let mut triaged_count = 0;
    let mut untriaged_list = Vec::new();

    for issue in issues {
        let has_label = !issue.labels.is_empty();
        let has_assignee = !issue.assignees.is_empty();

        if has_label && has_assignee {
            triaged_count += 1;
        } else {
            let hours_open = (Utc::now() - issue.created_at).num_hours();
            untriaged_list.push(UntriagedIssue {
                url: format!(
                    "https://github.com/{}/{}/issues/{}",
                    issue.org, issue.repo, issue.number
                ),
                org: issue.org.clone(),
                repo: issue.repo.clone(),
                number: issue.number,
                title: issue.title.clone(),
                created_at: issue.created_at,
                hours_open,
                missing_label: !has_label,
                missing_assignee: !has_assignee,
            });
        }
    }

    let total_issues = issues.len();
    let triage_rate = if total_issues > 0 {
        triaged_count as f64 / total_issues as f64 * 100.0
    } else {
        100.0
    };

    TriageGoalMetrics {
        new_issues_last_72h: total_issues,
        triaged_issues: triaged_count,
        untriaged_issues: untriaged_list.len(),
        triage_rate,
        status: GoalStatus::from_rate(triage_rate),
        untriaged_list,
    }
}

/// Goal 4: Ownership Files. Compliant = ownership file AND README.
fn calculate_ownership_goal(statuses: &[RepoOwnership]) -> OwnershipGoalMetrics {
    let mut repos_with_files = 0;
    let mut repos_needing_attention = Vec::new();

    for status in statuses {
        if status.has_owners && status.has_readme {
            repos_with_files += 1;
        } else {
            repos_needing_attention.push(OwnershipRepoStatus {
                url: format!("https://github.com/{}/{}", status.org, status.repo),
                org: status.org.clone(),
                repo: status.repo.clone(),
                has_owners: status.has_owners,
                has_readme: status.has_readme,
            });
        }
    }

    let total_repos = statuses.len();
    let compliance_rate = if total_repos > 0 {
        repos_with_files as f64 / total_repos as f64 * 100.0
    } else {
        100.0
    };

    OwnershipGoalMetrics {
        total_repos,
        repos_with_files,
        repos_missing_files: repos_needing_attention.len(),
        compliance_rate,
        status: GoalStatus::from_rate(compliance_rate),
        repos_needing_attention,
    }
}

fn calculate_per_repo_metrics(data: &RawGoalsData) -> Vec<RepoGoalMetrics> {
    let mut repo_map: HashMap<(String, String), RepoGoalMetrics> = HashMap::new();

    fn repo_entry<'a>(
        map: &'a mut HashMap<(String, String), RepoGoalMetrics>,
        org: &str,
        repo: &str,
    ) -> &'a mut RepoGoalMetrics {
        map.entry((org.to_string(), repo.to_string()))
            .or_insert_with(|| RepoGoalMetrics {
                org: org.to_string(),
                repo: repo.to_string(),
                ..Default::default()
            })
    }

    for status in &data.ownership_status {
        let metrics = repo_entry(&mut repo_map, &status.org, &status.repo);
        metrics.has_owners = status.has_owners;
        metrics.has_readme = status.has_readme;
    }

    for item in &data.activity_items {
        let metrics = repo_entry(&mut repo_map, &item.org, &item.repo);
        metrics.items_over_30_days += 1;
        metrics.total_open_items += 1;
    }

    for issue in &data.new_issues {
        let already_counted = data.activity_items.iter().any(|item| {
            item.org == issue.org && item.repo == issue.repo && item.number == issue.number
        });

        let metrics = repo_entry(&mut repo_map, &issue.org, &issue.repo);
        if !already_counted {
            metrics.total_open_items += 1;
        }

        metrics.new_issues_last_72h += 1;
        if issue.labels.is_empty() || issue.assignees.is_empty() {
            metrics.untriaged_count += 1;
        }
    }

    for metrics in repo_map.values_mut() {
        metrics.activity_compliance = if metrics.total_open_items > 0 {
            (metrics.total_open_items - metrics.items_over_30_days) as f64
                / metrics.total_open_items as f64
                * 100.0
        } else {
            100.0
        };

        metrics.triage_rate = if metrics.new_issues_last_72h > 0 {
            let triaged = metrics.new_issues_last_72h - metrics.untriaged_count;
            triaged as f64 / metrics.new_issues_last_72h as f64 * 100.0
        } else {
            100.0
        };

        // Ownership is binary per repo: 100 when both files exist, 0 otherwise.
        let ownership_rate = if metrics.has_owners && metrics.has_readme {
            100.0
        } else {
            0.0
        };

        let worst = metrics
            .activity_compliance
            .min(metrics.triage_rate)
            .min(ownership_rate);
        metrics.overall_status = Some(GoalStatus::from_rate(worst));
    }

    let mut result: Vec<RepoGoalMetrics> = repo_map.into_values().collect();
    result.sort_by(|a, b| {
        a.overall_status
            .cmp(&b.overall_status)
            .then_with(|| (&a.org, &a.repo).cmp(&(&b.org, &b.repo)))
    });

    result
}

/// Time remaining until baseline_date + 28 days, as weeks/days. An old
/// baseline keeps reporting "deadline passed"; that is the steady-state
/// behavior the dashboards expect.
fn calculate_time_remaining(baseline_date: &str) -> String {
    let Ok(date) = NaiveDate::parse_from_str(baseline_date, "%Y-%m-%d") else {
        return "unknown".to_string();
    };

    let target = date + Duration::days(28);
    let today = Utc::now().date_naive();
    let remaining = (target - today).num_days();

    if remaining < 0 {
        return "deadline passed".to_string();
    }

    let weeks = remaining / 7;
    if weeks > 0 {
        if weeks == 1 {
            return "1 week remaining".to_string();
        }
        return format!("{} weeks remaining", weeks);
    }
    if remaining == 1 {
        return "1 day remaining".to_string();
    }
    format!("{} days remaining", remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn goals_config(baseline: i64, date: &str) -> GoalsConfig {
        GoalsConfig {
            enabled: true,
            backlog_baseline: baseline,
            backlog_baseline_date: date.to_string(),
            ownership_files: vec![],
        }
    }

    fn stale_item(org: &str, repo: &str, number: u64, days: i64) -> ActivityItem {
        ActivityItem {
            org: org.to_string(),
            repo: repo.to_string(),
            number,
            title: format!("item {}", number),
            item_type: ItemType::Issue,
            updated_at: Utc::now() - chrono::Duration::days(days),
            days_since_update: days,
        }
    }

    fn new_issue(org: &str, repo: &str, number: u64, labels: &[&str], assignees: &[&str]) -> NewIssue {
        NewIssue {
            org: org.to_string(),
            repo: repo.to_string(),
            number,
            title: format!("issue {}", number),
            created_at: Utc::now() - chrono::Duration::hours(10),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            assignees: assignees.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_data_is_fully_compliant() {
        let calc = Calculator::new(&goals_config(0, ""));
        let progress = calc.calculate_goals_progress(&RawGoalsData::default(), 0);

        assert_eq!(progress.thirty_day_activity.compliance_rate, 100.0);
        assert_eq!(progress.triage_speed.triage_rate, 100.0);
        assert_eq!(progress.ownership_updates.compliance_rate, 100.0);
        assert_eq!(progress.thirty_day_activity.status, GoalStatus::OnTrack);
    }

    #[test]
    fn backlog_reduction_meets_target() {
        let calc = Calculator::new(&goals_config(100, "2024-01-01"));
        let mut data = RawGoalsData::default();
        data.backlog_count = 72;

        let progress = calc.calculate_goals_progress(&data, 1);
        let backlog = &progress.backlog_cleanup;

        assert_eq!(backlog.items_reduced, 28);
        assert_eq!(backlog.reduction_percent, 28.0);
        assert_eq!(backlog.status, GoalStatus::OnTrack);
        assert_eq!(backlog.time_remaining, "deadline passed");
    }

    #[test]
    fn backlog_zero_baseline_reports_zero_reduction() {
        let calc = Calculator::new(&goals_config(0, "not-a-date"));
        let progress = calc.calculate_goals_progress(&RawGoalsData::default(), 0);

        assert_eq!(progress.backlog_cleanup.reduction_percent, 0.0);
        assert_eq!(progress.backlog_cleanup.time_remaining, "unknown");
    }

    #[test]
    fn worst_offenders_capped_at_ten_sorted_descending() {
        let calc = Calculator::new(&goals_config(0, ""));
        let mut data = RawGoalsData::default();
        for i in 0..15 {
            data.activity_items
                .push(stale_item("konveyor", "crane", i, 31 + i as i64));
        }

        let progress = calc.calculate_goals_progress(&data, 1);
        let offenders = &progress.thirty_day_activity.worst_offenders;

        assert_eq!(offenders.len(), 10);
        assert!(offenders
            .windows(2)
            .all(|w| w[0].days_since_update >= w[1].days_since_update));
        assert_eq!(offenders[0].days_since_update, 45);
    }

    #[test]
    fn new_issues_extend_total_open_without_double_counting() {
        let calc = Calculator::new(&goals_config(0, ""));
        let mut data = RawGoalsData::default();
        data.activity_items.push(stale_item("o", "r", 1, 40));
        // Same number as the stale item: must not be counted twice.
        data.new_issues.push(new_issue("o", "r", 1, &[], &[]));
        data.new_issues.push(new_issue("o", "r", 2, &[], &[]));

        let progress = calc.calculate_goals_progress(&data, 1);
        assert_eq!(progress.thirty_day_activity.total_open_items, 2);
        assert_eq!(progress.thirty_day_activity.items_over_30_days, 1);
        assert_eq!(progress.thirty_day_activity.compliance_rate, 50.0);
    }

    #[test]
    fn triage_requires_label_and_assignee() {
        let calc = Calculator::new(&goals_config(0, ""));
        let mut data = RawGoalsData::default();
        data.new_issues
            .push(new_issue("o", "r", 1, &["bug"], &["alice"]));
        data.new_issues.push(new_issue("o", "r", 2, &["bug"], &[]));
        data.new_issues.push(new_issue("o", "r", 3, &[], &["bob"]));

        let progress = calc.calculate_goals_progress(&data, 1);
        let triage = &progress.triage_speed;

        assert_eq!(triage.triaged_issues, 1);
        assert_eq!(triage.untriaged_issues, 2);
        assert!((triage.triage_rate - 33.333).abs() < 0.01);
        assert!(triage.untriaged_list[0].missing_assignee);
        assert!(triage.untriaged_list[1].missing_label);
    }

    #[test]
    fn per_repo_metrics_sorted_by_severity_then_name() {
        let calc = Calculator::new(&goals_config(0, ""));
        let mut data = RawGoalsData::default();
        // "zeta" is fully compliant, "alpha" is critical.
        data.ownership_status.push(RepoOwnership {
            org: "o".to_string(),
            repo: "zeta".to_string(),
            has_owners: true,
            has_readme: true,
        });
        data.ownership_status.push(RepoOwnership {
            org: "o".to_string(),
            repo: "alpha".to_string(),
            has_owners: false,
            has_readme: true,
        });

        let progress = calc.calculate_goals_progress(&data, 2);
        let per_repo = &progress.per_repo_metrics;

        assert_eq!(per_repo[0].repo, "alpha");
        assert_eq!(per_repo[0].overall_status, Some(GoalStatus::Critical));
        assert_eq!(per_repo[1].repo, "zeta");
        assert_eq!(per_repo[1].overall_status, Some(GoalStatus::OnTrack));
    }

    #[test]
    fn ownership_goal_lists_missing_repos() {
        let calc = Calculator::new(&goals_config(0, ""));
        let mut data = RawGoalsData::default();
        data.ownership_status.push(RepoOwnership {
            org: "o".to_string(),
            repo: "a".to_string(),
            has_owners: true,
            has_readme: false,
        });
        data.ownership_status.push(RepoOwnership {
            org: "o".to_string(),
            repo: "b".to_string(),
            has_owners: true,
            has_readme: true,
        });

        let progress = calc.calculate_goals_progress(&data, 2);
        let ownership = &progress.ownership_updates;

        assert_eq!(ownership.repos_with_files, 1);
        assert_eq!(ownership.repos_missing_files, 1);
        assert_eq!(ownership.compliance_rate, 50.0);
        assert_eq!(ownership.repos_needing_attention[0].repo, "a");
    }
}
