use super::types::*;
use crate::config::{HistoryConfig, Maintainer, MaintainerConfig};
use crate::goals::{ActionItems, Calculator, CollectionCancelled, Fetcher, GoalsProgress};
use crate::models::{RepoKey, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the last `days` snapshots from both dashboard archives. Either
/// archive may be missing or partially broken; only a total absence of
/// usable dates is fatal.
pub async fn load_historical_data(history: &HistoryConfig) -> Result<HistoricalData> {
    let mut data = HistoricalData::default();
    let mut dates: HashSet<String> = HashSet::new();

    match load_available_dates(&history.community_health_dir).await {
        Ok(community_dates) => {
            for date in community_dates.iter().take(history.days) {
                match load_snapshot::<CommunityHealthSnapshot>(
                    &history.community_health_dir,
                    date,
                )
                .await
                {
                    Ok(snapshot) => {
                        data.community_health.insert(date.clone(), snapshot);
                        dates.insert(date.clone());
                    }
                    Err(e) => {
                        warn!(date = %date, error = %e, "Failed to load community health snapshot");
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "Failed to load community health dates"),
    }

    match load_available_dates(&history.stale_dir).await {
        Ok(stale_dates) => {
            for date in stale_dates.iter().take(history.days) {
                match load_snapshot::<StaleSnapshot>(&history.stale_dir, date).await {
                    Ok(snapshot) => {
                        data.stale.insert(date.clone(), snapshot);
                        dates.insert(date.clone());
                    }
                    Err(e) => {
                        warn!(date = %date, error = %e, "Failed to load stale snapshot");
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "Failed to load stale dates"),
    }

    data.available_dates = dates.into_iter().collect();
    data.available_dates.sort_by(|a, b| b.cmp(a));

    if data.available_dates.is_empty() {
        return Err("no historical data available".into());
    }

    info!(
        dates_loaded = data.available_dates.len(),
        community_health = data.community_health.len(),
        stale = data.stale.len(),
        newest_date = %data.available_dates[0],
        "Historical data loaded"
    );

    Ok(data)
}

/// The archive index is either `{"available_dates": [...]}` or a bare date
/// array; both shapes exist in the wild.
#[derive(Deserialize)]
#[serde(untagged)]
enum DateIndex {
    Object { available_dates: Vec<String> },
    Bare(Vec<String>),
}

async fn load_available_dates(dir: &str) -> Result<Vec<String>> {
    let index_path = Path::new(dir).join("index.json");
    let content = tokio::fs::read_to_string(&index_path).await?;

    let mut dates = match serde_json::from_str::<DateIndex>(&content)? {
        DateIndex::Object { available_dates } => available_dates,
        DateIndex::Bare(dates) => dates,
    };
    dates.sort_by(|a, b| b.cmp(a));
    Ok(dates)
}

async fn load_snapshot<T: serde::de::DeserializeOwned>(dir: &str, date: &str) -> Result<T> {
    let path = Path::new(dir).join(format!("{}.json", date));
    let content = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Join the newest and week-old snapshots for one repository. A repo absent
/// from a snapshot contributes zeroed metrics, not an error.
pub fn aggregate_repo_data(
    key: &RepoKey,
    data: &HistoricalData,
    dashboard_base_url: &str,
) -> Result<RepoReport> {
    if data.available_dates.is_empty() {
        return Err(format!("no data available for {}", key).into());
    }

    let mut report = RepoReport {
        org: key.org.clone(),
        repo: key.repo.clone(),
        dashboard_url: key.github_url(),
        stale_url: format!("{}/stale-dashboard/#repo={}", dashboard_base_url, key),
        community_health_url: format!(
            "{}/community-health-dashboard/#repo={}",
            dashboard_base_url, key
        ),
        ..Default::default()
    };

    let current_date = &data.available_dates[0];
    let previous_date = data.available_dates.get(7);

    if let Some(snapshot) = data.community_health.get(current_date) {
        if let Some(row) = find_community_row(snapshot, key) {
            report.current_health = health_metrics(row);
            report.new_contributors = row
                .new_contributors_list
                .iter()
                .filter(|username| !username.to_lowercase().contains("[bot]"))
                .map(|username| Contributor {
                    username: username.clone(),
                })
                .collect();
        }
    }

    if let Some(date) = previous_date {
        if let Some(snapshot) = data.community_health.get(date) {
            if let Some(row) = find_community_row(snapshot, key) {
                report.previous_health = health_metrics(row);
            }
        }
    }

    // Open issue count drives the health trend.
    report.health_trend = calculate_trend(
        report.current_health.open_issues,
        report.previous_health.open_issues,
    );

    if let Some(snapshot) = data.stale.get(current_date) {
        if let Some(row) = find_stale_row(snapshot, key) {
            report.current_stale = StaleMetrics {
                total_stale: row.total_stale,
                stale_issues: row.stale_issues,
                stale_prs: row.stale_prs,
            };
            report.stale_items = row.items.iter().take(10).cloned().collect();
        }
    }

    if let Some(date) = previous_date {
        if let Some(snapshot) = data.stale.get(date) {
            if let Some(row) = find_stale_row(snapshot, key) {
                report.previous_stale = StaleMetrics {
                    total_stale: row.total_stale,
                    stale_issues: row.stale_issues,
                    stale_prs: row.stale_prs,
                };
            }
        }
    }

    report.stale_trend = calculate_trend(
        report.current_stale.total_stale,
        report.previous_stale.total_stale,
    );

    Ok(report)
}

fn find_community_row<'a>(
    snapshot: &'a CommunityHealthSnapshot,
    key: &RepoKey,
) -> Option<&'a CommunityRepoData> {
    snapshot
        .repos
        .iter()
        .find(|row| row.org == key.org && row.repo == key.repo)
}

fn find_stale_row<'a>(snapshot: &'a StaleSnapshot, key: &RepoKey) -> Option<&'a StaleRepoData> {
    snapshot
        .repos
        .iter()
        .find(|row| row.org == key.org && row.repo == key.repo)
}

fn health_metrics(row: &CommunityRepoData) -> HealthMetrics {
    HealthMetrics {
        contributors: row.contributors,
        new_contributors: row.new_contributors,
        avg_issue_response_ms: row.avg_issue_response_ms,
        avg_pr_response_ms: row.avg_pr_response_ms,
        pr_merge_rate: row.pr_merge_rate,
        open_issues: row.open_issues,
        open_prs: row.open_prs,
        coverage: row.coverage,
        vulnerabilities: row.snyk_vulnerabilities.clone(),
    }
}

/// Week-over-week change. A zero previous value means percent change is
/// undefined; report 100%/up when anything appeared and flat otherwise.
pub fn calculate_trend(current: i64, previous: i64) -> TrendMetrics {
    let absolute = current - previous;

    if previous == 0 {
        return if current > 0 {
            TrendMetrics {
                absolute,
                percent: 100.0,
                direction: TrendDirection::Up,
            }
        } else {
            TrendMetrics {
                absolute,
                percent: 0.0,
                direction: TrendDirection::Same,
            }
        };
    }

    let percent = (absolute as f64 / previous as f64) * 100.0;
    let direction = match absolute {
        n if n > 0 => TrendDirection::Up,
        n if n < 0 => TrendDirection::Down,
        _ => TrendDirection::Same,
    };

    TrendMetrics {
        absolute,
        percent,
        direction,
    }
}

/// Maintainers owning several repos get one consolidated email.
pub fn group_maintainers_by_email(maintainers: &[Maintainer]) -> HashMap<String, Vec<Maintainer>> {
    let mut grouped: HashMap<String, Vec<Maintainer>> = HashMap::new();
    for m in maintainers {
        grouped.entry(m.email.clone()).or_default().push(m.clone());
    }
    grouped
}

/// Distinct repos across all maintainers, in first-seen order.
pub fn extract_all_repos(maintainers: &[Maintainer]) -> Vec<RepoKey> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();
    for m in maintainers {
        let key = m.repo_key();
        if seen.insert(key.clone()) {
            repos.push(key);
        }
    }
    repos
}

/// Build one report per recipient email. Goals are fetched once and shared
/// across all reports; action items are fetched per repository. Both degrade
/// to absent sections when their collection fails.
pub async fn generate_email_reports(
    config: &MaintainerConfig,
    data: &HistoricalData,
    fetcher: &mut Fetcher,
) -> Result<HashMap<String, EmailReport>> {
    let mut reports = HashMap::new();

    let grouped = group_maintainers_by_email(&config.maintainers);
    let all_repos = extract_all_repos(&config.maintainers);

    let goals_progress = fetch_goals_progress(config, &all_repos, fetcher).await?;

    for (email, maintainers) in grouped {
        let mut report = EmailReport {
            maintainer_name: maintainers[0].name.clone(),
            week_ending: data.available_dates[0].clone(),
            generated_at: chrono::Utc::now(),
            total_repos: maintainers.len(),
            goals_progress: goals_progress.clone(),
            ..Default::default()
        };

        for m in &maintainers {
            let key = m.repo_key();
            let mut repo_report =
                match aggregate_repo_data(&key, data, &config.history.dashboard_base_url) {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(repo = %key, error = %e, "Failed to aggregate repo data");
                        continue;
                    }
                };

            repo_report.action_items = fetch_repo_action_items(config, &key, fetcher).await?;

            report.total_stale += repo_report.current_stale.total_stale;
            report.total_new_contributors += repo_report.new_contributors.len();
            report.repos.push(repo_report);
        }

        reports.insert(email, report);
    }

    info!(reports_generated = reports.len(), "Email reports generated");

    Ok(reports)
}

/// Goals progress across every configured repo, or `None` when tracking is
/// disabled or collection failed. Only cancellation propagates as an error.
async fn fetch_goals_progress(
    config: &MaintainerConfig,
    repos: &[RepoKey],
    fetcher: &mut Fetcher,
) -> Result<Option<GoalsProgress>> {
    let Some(goals_config) = config.goals.as_ref().filter(|g| g.enabled) else {
        debug!("Goals tracking is disabled");
        return Ok(None);
    };

    info!("Fetching goals progress data");

    let collection = match fetcher.fetch_goals_data(repos).await {
        Ok(collection) => collection,
        Err(e) => {
            if fetcher_cancelled(e.as_ref()) {
                return Err(e);
            }
            warn!(error = %e, "Failed to fetch goals data, continuing without it");
            return Ok(None);
        }
    };

    let calculator = Calculator::new(goals_config);
    let progress = calculator.calculate_goals_progress(&collection.data, repos.len());

    info!(
        total_repos = progress.total_repos_checked,
        activity_compliance = progress.thirty_day_activity.compliance_rate,
        triage_rate = progress.triage_speed.triage_rate,
        "Goals progress calculated"
    );

    Ok(Some(progress))
}

async fn fetch_repo_action_items(
    config: &MaintainerConfig,
    key: &RepoKey,
    fetcher: &mut Fetcher,
) -> Result<Option<ActionItems>> {
    let Some(action_config) = config.action_items.as_ref().filter(|a| a.enabled) else {
        return Ok(None);
    };

    match fetcher
        .fetch_action_items(std::slice::from_ref(key), action_config)
        .await
    {
        Ok(collection) => Ok(Some(collection.items)),
        Err(e) => {
            if fetcher_cancelled(e.as_ref()) {
                return Err(e);
            }
            warn!(repo = %key, error = %e, "Failed to fetch action items for repo, continuing without them");
            Ok(None)
        }
    }
}

fn fetcher_cancelled(err: &(dyn std::error::Error + 'static)) -> bool {
    err.downcast_ref::<CollectionCancelled>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community_snapshot(rows: Vec<CommunityRepoData>) -> CommunityHealthSnapshot {
        CommunityHealthSnapshot {
            repos: rows,
            ..Default::default()
        }
    }

    fn community_row(open_issues: i64, new_contributors: Vec<&str>) -> CommunityRepoData {
        CommunityRepoData {
            org: "konveyor".to_string(),
            repo: "crane".to_string(),
            contributors: 12,
            new_contributors: new_contributors.len() as i64,
            new_contributors_list: new_contributors.iter().map(|s| s.to_string()).collect(),
            open_issues,
            open_prs: 3,
            ..Default::default()
        }
    }

    fn key() -> RepoKey {
        RepoKey::new("konveyor", "crane")
    }

    fn dates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("2026-08-{:02}", 28 - i)).collect()
    }

    #[test]
    fn trend_with_nonzero_previous() {
        let trend = calculate_trend(5, 10);
        assert_eq!(trend.absolute, -5);
        assert_eq!(trend.percent, -50.0);
        assert_eq!(trend.direction, TrendDirection::Down);
    }

    #[test]
    fn trend_from_zero_previous_is_capped() {
        let trend = calculate_trend(5, 0);
        assert_eq!(trend.absolute, 5);
        assert_eq!(trend.percent, 100.0);
        assert_eq!(trend.direction, TrendDirection::Up);

        let flat = calculate_trend(0, 0);
        assert_eq!(flat.percent, 0.0);
        assert_eq!(flat.direction, TrendDirection::Same);
    }

    #[test]
    fn trend_equal_values_is_same() {
        let trend = calculate_trend(3, 3);
        assert_eq!(trend.absolute, 0);
        assert_eq!(trend.direction, TrendDirection::Same);
    }

    #[test]
    fn bots_excluded_from_new_contributors() {
        let mut data = HistoricalData::default();
        data.available_dates = dates(1);
        data.community_health.insert(
            data.available_dates[0].clone(),
            community_snapshot(vec![community_row(
                4,
                vec!["alice", "dependabot[bot]", "Renovate[Bot]", "bob"],
            )]),
        );

        let report = aggregate_repo_data(&key(), &data, "https://example.github.io/rt").unwrap();
        let names: Vec<_> = report
            .new_contributors
            .iter()
            .map(|c| c.username.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn previous_week_used_when_eight_dates_exist() {
        let mut data = HistoricalData::default();
        data.available_dates = dates(8);
        data.community_health.insert(
            data.available_dates[0].clone(),
            community_snapshot(vec![community_row(10, vec![])]),
        );
        data.community_health.insert(
            data.available_dates[7].clone(),
            community_snapshot(vec![community_row(4, vec![])]),
        );

        let report = aggregate_repo_data(&key(), &data, "base").unwrap();
        assert_eq!(report.health_trend.absolute, 6);
        assert_eq!(report.health_trend.percent, 150.0);
        assert_eq!(report.health_trend.direction, TrendDirection::Up);
    }

    #[test]
    fn short_history_skips_previous_comparison() {
        let mut data = HistoricalData::default();
        data.available_dates = dates(3);
        data.community_health.insert(
            data.available_dates[0].clone(),
            community_snapshot(vec![community_row(10, vec![])]),
        );

        let report = aggregate_repo_data(&key(), &data, "base").unwrap();
        // Previous metrics stay zeroed, so the trend takes the zero-previous
        // branch.
        assert_eq!(report.health_trend.percent, 100.0);
        assert_eq!(report.health_trend.direction, TrendDirection::Up);
    }

    #[test]
    fn missing_repo_row_yields_zero_metrics() {
        let mut data = HistoricalData::default();
        data.available_dates = dates(1);
        data.community_health.insert(
            data.available_dates[0].clone(),
            community_snapshot(vec![]),
        );

        let report = aggregate_repo_data(&key(), &data, "base").unwrap();
        assert_eq!(report.current_health.open_issues, 0);
        assert!(report.new_contributors.is_empty());
    }

    #[test]
    fn stale_items_truncated_to_ten() {
        let items: Vec<StaleItem> = (1..=25)
            .map(|n| StaleItem {
                number: n,
                ..Default::default()
            })
            .collect();

        let mut data = HistoricalData::default();
        data.available_dates = dates(1);
        data.stale.insert(
            data.available_dates[0].clone(),
            StaleSnapshot {
                repos: vec![StaleRepoData {
                    org: "konveyor".to_string(),
                    repo: "crane".to_string(),
                    total_stale: 25,
                    stale_issues: 20,
                    stale_prs: 5,
                    items,
                }],
                ..Default::default()
            },
        );

        let report = aggregate_repo_data(&key(), &data, "base").unwrap();
        assert_eq!(report.stale_items.len(), 10);
        assert_eq!(report.current_stale.total_stale, 25);
    }

    #[test]
    fn grouping_consolidates_by_email() {
        let maintainers = vec![
            Maintainer {
                org: "konveyor".to_string(),
                repo: "crane".to_string(),
                email: "a@example.com".to_string(),
                name: "A".to_string(),
            },
            Maintainer {
                org: "konveyor".to_string(),
                repo: "tackle2-hub".to_string(),
                email: "a@example.com".to_string(),
                name: "A".to_string(),
            },
            Maintainer {
                org: "konveyor".to_string(),
                repo: "crane".to_string(),
                email: "b@example.com".to_string(),
                name: "B".to_string(),
            },
        ];

        let grouped = group_maintainers_by_email(&maintainers);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["a@example.com"].len(), 2);

        let repos = extract_all_repos(&maintainers);
        assert_eq!(repos.len(), 2);
    }

    #[tokio::test]
    async fn index_object_and_bare_array_both_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();

        tokio::fs::write(
            dir.path().join("index.json"),
            r#"{"available_dates": ["2026-08-27", "2026-08-28"]}"#,
        )
        .await
        .unwrap();
        let dates = load_available_dates(&path).await.unwrap();
        assert_eq!(dates, vec!["2026-08-28", "2026-08-27"]);

        tokio::fs::write(
            dir.path().join("index.json"),
            r#"["2026-08-26", "2026-08-28"]"#,
        )
        .await
        .unwrap();
        let dates = load_available_dates(&path).await.unwrap();
        assert_eq!(dates, vec!["2026-08-28", "2026-08-26"]);
    }

    #[test]
    fn cancellation_detected_by_type_not_message() {
        let cancelled: Box<dyn std::error::Error + Send + Sync> = Box::new(CollectionCancelled);
        assert!(fetcher_cancelled(cancelled.as_ref()));

        // A transient error that merely mentions the word must degrade the
        // goals section, not abort the run.
        let misleading: Box<dyn std::error::Error + Send + Sync> =
            "connection cancelled by peer".into();
        assert!(!fetcher_cancelled(misleading.as_ref()));
    }

    #[tokio::test]
    async fn empty_archives_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryConfig {
            community_health_dir: dir.path().join("ch").to_str().unwrap().to_string(),
            stale_dir: dir.path().join("stale").to_str().unwrap().to_string(),
            dashboard_base_url: "base".to_string(),
            days: 14,
        };

        let err = load_historical_data(&history).await.unwrap_err();
        assert!(err.to_string().contains("no historical data"));
    }

    #[tokio::test]
    async fn corrupt_snapshot_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ch = dir.path().join("ch");
        tokio::fs::create_dir_all(&ch).await.unwrap();
        tokio::fs::write(
            ch.join("index.json"),
            r#"["2026-08-28", "2026-08-27"]"#,
        )
        .await
        .unwrap();
        tokio::fs::write(ch.join("2026-08-28.json"), "{ not json").await.unwrap();
        tokio::fs::write(
            ch.join("2026-08-27.json"),
            r#"{"date": "2026-08-27", "repositories": []}"#,
        )
        .await
        .unwrap();

        let history = HistoryConfig {
            community_health_dir: ch.to_str().unwrap().to_string(),
            stale_dir: dir.path().join("none").to_str().unwrap().to_string(),
            dashboard_base_url: "base".to_string(),
            days: 14,
        };

        let data = load_historical_data(&history).await.unwrap();
        assert_eq!(data.available_dates, vec!["2026-08-27"]);
        assert!(data.community_health.contains_key("2026-08-27"));
    }
}
