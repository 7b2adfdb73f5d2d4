use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use health_reporter::config::{
    ActionItemsConfig, HistoryConfig, Maintainer, MaintainerConfig, SmtpConfig,
};
use health_reporter::email_sender::{EmailSender, MailTransport};
use health_reporter::github::{
    CombinedStatus, CommentData, CommitData, HostingApi, IssueData, IssueSort, Page, PullData,
    RateLimitState, RepoInfo, ReviewData, SortDirection,
};
use health_reporter::goals::Fetcher;
use health_reporter::models::{RepoKey, Result};
use health_reporter::report::aggregator::{generate_email_reports, load_historical_data};
use health_reporter::report::{ReportOptions, Reporter};
use health_reporter::wait;
use lettre::Message;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Repo A carries one 48-hour-old unanswered issue; repo B is clean.
struct TwoRepoHost {
    repo_a: RepoKey,
    issue_created_at: DateTime<Utc>,
}

#[async_trait]
impl HostingApi for TwoRepoHost {
    async fn list_issues(
        &self,
        repo: &RepoKey,
        _sort: IssueSort,
        _direction: SortDirection,
        _since: Option<DateTime<Utc>>,
        _page: u32,
    ) -> Result<Page<IssueData>> {
        if *repo == self.repo_a {
            Ok(Page::last(vec![IssueData {
                number: 42,
                title: "agent crashes on startup".to_string(),
                author: "reporter".to_string(),
                created_at: self.issue_created_at,
                updated_at: self.issue_created_at,
                labels: vec![],
                assignees: vec![],
                is_pull_request: false,
            }]))
        } else {
            Ok(Page::last(vec![]))
        }
    }

    async fn list_pulls(&self, _repo: &RepoKey, _page: u32) -> Result<Page<PullData>> {
        Ok(Page::last(vec![]))
    }

    async fn list_reviews(
        &self,
        _repo: &RepoKey,
        _number: u64,
        _page: u32,
    ) -> Result<Page<ReviewData>> {
        Ok(Page::last(vec![]))
    }

    async fn list_pull_commits(
        &self,
        _repo: &RepoKey,
        _number: u64,
        _page: u32,
    ) -> Result<Page<CommitData>> {
        Ok(Page::last(vec![]))
    }

    async fn list_issue_comments(
        &self,
        _repo: &RepoKey,
        _number: u64,
        _since: Option<DateTime<Utc>>,
        _page: u32,
    ) -> Result<Page<CommentData>> {
        Ok(Page::last(vec![]))
    }

    async fn get_repo(&self, _repo: &RepoKey) -> Result<RepoInfo> {
        Ok(RepoInfo {
            default_branch: "main".to_string(),
        })
    }

    async fn combined_status(&self, _repo: &RepoKey, _git_ref: &str) -> Result<CombinedStatus> {
        Ok(CombinedStatus {
            state: "success".to_string(),
        })
    }

    async fn content_exists(&self, _repo: &RepoKey, _path: &str) -> Result<bool> {
        Ok(false)
    }

    async fn permission_level(&self, _repo: &RepoKey, _username: &str) -> Result<String> {
        Ok("none".to_string())
    }

    async fn rate_limit(&self) -> Result<RateLimitState> {
        Ok(RateLimitState {
            remaining: 5000,
            reset_at: Utc::now() + Duration::hours(1),
        })
    }

    async fn count_merged_prs_by_author(&self, _repo: &RepoKey, _author: &str) -> Result<u64> {
        Ok(0)
    }
}

/// Records every outbound message instead of touching the network.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> Result<()> {
        self.sent.lock().unwrap().push(message.formatted());
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}

async fn write_history(dir: &TempDir) -> HistoryConfig {
    let ch = dir.path().join("community-health");
    let stale = dir.path().join("stale");
    tokio::fs::create_dir_all(&ch).await.unwrap();
    tokio::fs::create_dir_all(&stale).await.unwrap();

    let index = r#"{"available_dates": ["2026-08-28"]}"#;
    tokio::fs::write(ch.join("index.json"), index).await.unwrap();
    tokio::fs::write(stale.join("index.json"), index).await.unwrap();

    let community = serde_json::json!({
        "date": "2026-08-28",
        "repositories": [
            {
                "org": "konveyor", "repo": "crane",
                "contributors": 9, "newContributorsList": ["alice"],
                "newContributors": 1,
                "avgIssueResponseMs": 7_200_000.0,
                "openIssues": 12, "openPRs": 4,
                "coverage": null, "snykVulnerabilities": null
            },
            {
                "org": "konveyor", "repo": "tackle2-hub",
                "contributors": 5, "newContributorsList": [],
                "openIssues": 2, "openPRs": 1,
                "coverage": 81.5
            }
        ]
    });
    tokio::fs::write(
        ch.join("2026-08-28.json"),
        serde_json::to_vec(&community).unwrap(),
    )
    .await
    .unwrap();

    let stale_doc = serde_json::json!({
        "date": "2026-08-28",
        "totalStale": 3,
        "repositories": [
            {
                "org": "konveyor", "repo": "crane",
                "totalStale": 3, "staleIssues": 2, "stalePRs": 1,
                "items": [
                    {"number": 7, "title": "old bug", "type": "issue", "author": "x", "labels": []}
                ]
            }
        ]
    });
    tokio::fs::write(
        stale.join("2026-08-28.json"),
        serde_json::to_vec(&stale_doc).unwrap(),
    )
    .await
    .unwrap();

    HistoryConfig {
        community_health_dir: ch.to_str().unwrap().to_string(),
        stale_dir: stale.to_str().unwrap().to_string(),
        dashboard_base_url: "https://example.github.io/health".to_string(),
        days: 14,
    }
}

fn two_repo_config(history: HistoryConfig) -> MaintainerConfig {
    MaintainerConfig {
        maintainers: vec![
            Maintainer {
                org: "konveyor".to_string(),
                repo: "crane".to_string(),
                email: "dev@example.com".to_string(),
                name: "Dev".to_string(),
            },
            Maintainer {
                org: "konveyor".to_string(),
                repo: "tackle2-hub".to_string(),
                email: "dev@example.com".to_string(),
                name: "Dev".to_string(),
            },
        ],
        cc_emails: vec!["lead@example.com".to_string()],
        smtp: SmtpConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            from_email: "bot@example.com".to_string(),
            from_name: "Health Bot".to_string(),
        },
        goals: None,
        action_items: Some(ActionItemsConfig {
            enabled: true,
            issue_response_time_hours: 24,
            pr_review_wait_hours: 48,
            check_default_branch_ci: false,
            check_approved_prs: false,
            check_external_contributors: false,
            check_prs_awaiting_author: false,
            pr_awaiting_author_response_days: 0,
        }),
        history,
    }
}

fn host() -> Arc<TwoRepoHost> {
    Arc::new(TwoRepoHost {
        repo_a: RepoKey::new("konveyor", "crane"),
        issue_created_at: Utc::now() - Duration::hours(48),
    })
}

#[tokio::test]
async fn two_repo_report_flags_only_the_unanswered_issue() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let data = load_historical_data(&config.history).await.unwrap();
    let (_handle, cancel) = wait::channel();
    let mut fetcher = Fetcher::new(host(), vec![], cancel);

    let reports = generate_email_reports(&config, &data, &mut fetcher)
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports["dev@example.com"];
    assert_eq!(report.total_repos, 2);
    assert_eq!(report.repos.len(), 2);
    assert_eq!(report.week_ending, "2026-08-28");
    assert_eq!(report.total_stale, 3);
    assert_eq!(report.total_new_contributors, 1);

    let crane = report
        .repos
        .iter()
        .find(|r| r.repo == "crane")
        .expect("crane report");
    let items = crane.action_items.as_ref().expect("action items");
    assert_eq!(items.unresponded_issues.len(), 1);
    assert_eq!(items.unresponded_issues[0].number, 42);
    assert_eq!(items.unresponded_issues[0].days_since, 2);
    assert_eq!(items.total_items, 1);
    assert_eq!(crane.current_health.open_issues, 12);
    assert_eq!(crane.stale_items.len(), 1);

    let hub = report
        .repos
        .iter()
        .find(|r| r.repo == "tackle2-hub")
        .expect("tackle2-hub report");
    let hub_items = hub.action_items.as_ref().expect("action items");
    assert_eq!(hub_items.total_items, 0);
    assert_eq!(hub.current_health.coverage, Some(81.5));
}

#[tokio::test]
async fn confirm_run_delivers_maintainer_and_summary_emails() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let transport = Arc::new(RecordingTransport::default());
    let sender = EmailSender::with_transport(config.smtp.clone(), transport.clone());

    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel).with_sender(sender);

    reporter
        .generate_and_send_weekly_reports(&config, &ReportOptions::default())
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);

    let bodies: Vec<String> = sent
        .iter()
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .collect();
    assert!(bodies
        .iter()
        .any(|b| b.contains("[Community Health] Weekly Report - Week ending 2026-08-28")));
    assert!(bodies
        .iter()
        .any(|b| b.contains("[Community Health] Team Summary - Week ending 2026-08-28")));
}

#[tokio::test]
async fn dry_run_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let transport = Arc::new(RecordingTransport::default());
    let sender = EmailSender::with_transport(config.smtp.clone(), transport.clone());

    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel).with_sender(sender);

    let options = ReportOptions {
        dry_run: true,
        ..Default::default()
    };
    reporter
        .generate_and_send_weekly_reports(&config, &options)
        .await
        .unwrap();

    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn email_filter_rejects_unknown_recipient() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel);

    let options = ReportOptions {
        dry_run: true,
        filter_email: Some("nobody@example.com".to_string()),
        ..Default::default()
    };
    let err = reporter
        .generate_and_send_weekly_reports(&config, &options)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no report found for email"));
}

#[tokio::test]
async fn repo_filter_keeps_matching_report() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let transport = Arc::new(RecordingTransport::default());
    let sender = EmailSender::with_transport(config.smtp.clone(), transport.clone());

    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel).with_sender(sender);

    let options = ReportOptions {
        filter_repo: Some("konveyor/crane".to_string()),
        ..Default::default()
    };
    reporter
        .generate_and_send_weekly_reports(&config, &options)
        .await
        .unwrap();

    // The maintainer owning the repo still gets their report, plus the summary.
    assert_eq!(transport.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn repo_filter_rejects_malformed_and_unknown_repos() {
    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel);

    let options = ReportOptions {
        dry_run: true,
        filter_repo: Some("crane".to_string()),
        ..Default::default()
    };
    let err = reporter
        .generate_and_send_weekly_reports(&config, &options)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid repo filter"));

    let options = ReportOptions {
        dry_run: true,
        filter_repo: Some("konveyor/does-not-exist".to_string()),
        ..Default::default()
    };
    let err = reporter
        .generate_and_send_weekly_reports(&config, &options)
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("no report found for repo: konveyor/does-not-exist"));
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_counts_into_run_error() {
    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn send(&self, _message: Message) -> Result<()> {
            Err("550 mailbox unavailable".into())
        }

        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }
    }

    let dir = TempDir::new().unwrap();
    let config = two_repo_config(write_history(&dir).await);

    let sender = EmailSender::with_transport(config.smtp.clone(), Arc::new(FailingTransport));
    let (_handle, cancel) = wait::channel();
    let reporter = Reporter::new(host(), cancel).with_sender(sender);

    let err = reporter
        .generate_and_send_weekly_reports(&config, &ReportOptions::default())
        .await
        .unwrap_err();
    // One maintainer email plus one CC summary email.
    assert!(err.to_string().contains("failed to send 2 emails"));
}
