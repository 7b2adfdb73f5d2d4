use super::aggregator::{generate_email_reports, load_historical_data};
use super::summary::generate_summary_report;
use super::template::{
    render_html_email, render_summary_html_email, render_summary_text_email, render_text_email,
};
use super::types::EmailReport;
use crate::config::MaintainerConfig;
use crate::email_sender::EmailSender;
use crate::github::HostingApi;
use crate::goals::Fetcher;
use crate::models::{RepoKey, Result};
use crate::wait::CancelSignal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

const SUBJECT_PREFIX: &str = "[Community Health]";

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Generate and log everything, send nothing.
    pub dry_run: bool,
    /// Print one rendered HTML email to stdout and exit.
    pub preview: bool,
    /// Restrict individual delivery to one recipient address.
    pub filter_email: Option<String>,
    /// Restrict individual delivery to reports covering one `org/repo`.
    pub filter_repo: Option<String>,
}

/// Drives the whole weekly run: load history, collect signals, render,
/// deliver.
pub struct Reporter {
    client: Arc<dyn HostingApi>,
    cancel: CancelSignal,
    sender: Option<EmailSender>,
}

impl Reporter {
    pub fn new(client: Arc<dyn HostingApi>, cancel: CancelSignal) -> Self {
        Self {
            client,
            cancel,
            sender: None,
        }
    }

    /// Use a pre-built sender instead of constructing one from config and
    /// environment credentials.
    pub fn with_sender(mut self, sender: EmailSender) -> Self {
        self.sender = Some(sender);
        self
    }

    pub async fn generate_and_send_weekly_reports(
        &self,
        config: &MaintainerConfig,
        options: &ReportOptions,
    ) -> Result<()> {
        info!(
            dry_run = options.dry_run,
            preview = options.preview,
            filter_email = options.filter_email.as_deref().unwrap_or(""),
            filter_repo = options.filter_repo.as_deref().unwrap_or(""),
            "Starting weekly email report generation"
        );

        let data = load_historical_data(&config.history).await?;

        let ownership_files = config
            .goals
            .as_ref()
            .map(|g| g.ownership_files.clone())
            .unwrap_or_default();
        let mut fetcher = Fetcher::new(self.client.clone(), ownership_files, self.cancel.clone());

        let all_reports = generate_email_reports(config, &data, &mut fetcher).await?;

        // Filters narrow individual delivery only; the summary always covers
        // the full set.
        let mut reports = all_reports.clone();

        if let Some(filter_email) = &options.filter_email {
            let Some(report) = reports.remove(filter_email) else {
                return Err(format!("no report found for email: {}", filter_email).into());
            };
            reports = HashMap::from([(filter_email.clone(), report)]);
            info!(email = %filter_email, "Filtered to specific email");
        }

        if let Some(filter_repo) = &options.filter_repo {
            let Some(key) = RepoKey::parse(filter_repo) else {
                return Err(
                    format!("invalid repo filter (expected org/repo): {}", filter_repo).into(),
                );
            };
            reports.retain(|_, report| {
                report
                    .repos
                    .iter()
                    .any(|r| r.org == key.org && r.repo == key.repo)
            });
            if reports.is_empty() {
                return Err(format!("no report found for repo: {}", key).into());
            }
            info!(repo = %key, reports = reports.len(), "Filtered to specific repo");
        }

        if options.preview {
            let Some(report) = reports.values().next() else {
                return Err("no reports to preview".into());
            };
            let html_body = render_html_email(report)?;
            println!("{}", html_body);
            return Ok(());
        }

        let built_sender;
        let sender: Option<&EmailSender> = if options.dry_run {
            None
        } else if let Some(sender) = &self.sender {
            Some(sender)
        } else {
            built_sender = EmailSender::new(config.smtp.clone())?;
            Some(&built_sender)
        };

        if let Some(sender) = sender {
            sender.test_connection().await?;
        }

        let mut sent_count = 0usize;
        let mut failed_count = 0usize;

        for (email, report) in &reports {
            info!(email = %email, repos = report.repos.len(), "Processing email report");

            let html_body = match render_html_email(report) {
                Ok(body) => body,
                Err(e) => {
                    error!(email = %email, error = %e, "Failed to render HTML email");
                    failed_count += 1;
                    continue;
                }
            };
            let text_body = match render_text_email(report) {
                Ok(body) => body,
                Err(e) => {
                    error!(email = %email, error = %e, "Failed to render text email");
                    failed_count += 1;
                    continue;
                }
            };

            let subject = format!(
                "{} Weekly Report - Week ending {}",
                SUBJECT_PREFIX, report.week_ending
            );

            match sender {
                None => {
                    info!(
                        to = %email,
                        subject = %subject,
                        repos = report.repos.len(),
                        total_stale = report.total_stale,
                        "[DRY RUN] Would send email"
                    );
                    sent_count += 1;
                }
                Some(sender) => {
                    // CC recipients get the summary email instead.
                    match sender
                        .send_email(email, &subject, &html_body, &text_body, &[])
                        .await
                    {
                        Ok(()) => sent_count += 1,
                        Err(e) => {
                            error!(email = %email, error = %e, "Failed to send email");
                            failed_count += 1;
                        }
                    }
                }
            }
        }

        if !config.cc_emails.is_empty() && !all_reports.is_empty() {
            self.send_summary(
                config,
                &all_reports,
                sender,
                &mut sent_count,
                &mut failed_count,
            )
            .await;
        }

        let total_expected = reports.len()
            + if all_reports.is_empty() {
                0
            } else {
                config.cc_emails.len()
            };
        info!(
            sent = sent_count,
            failed = failed_count,
            total = total_expected,
            "Email report generation completed"
        );

        if failed_count > 0 {
            return Err(format!("failed to send {} emails", failed_count).into());
        }

        Ok(())
    }

    async fn send_summary(
        &self,
        config: &MaintainerConfig,
        all_reports: &HashMap<String, EmailReport>,
        sender: Option<&EmailSender>,
        sent_count: &mut usize,
        failed_count: &mut usize,
    ) {
        info!(
            cc_count = config.cc_emails.len(),
            "Generating summary email for CC recipients"
        );

        // Goals progress is identical across reports; take it from any one.
        let goals_progress = all_reports
            .values()
            .next()
            .and_then(|report| report.goals_progress.clone());

        let summary = generate_summary_report(all_reports, goals_progress);

        let html_body = match render_summary_html_email(&summary) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to render summary HTML email");
                *failed_count += config.cc_emails.len();
                return;
            }
        };
        let text_body = match render_summary_text_email(&summary) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to render summary text email");
                *failed_count += config.cc_emails.len();
                return;
            }
        };

        let subject = format!(
            "{} Team Summary - Week ending {}",
            SUBJECT_PREFIX, summary.week_ending
        );

        for cc_email in &config.cc_emails {
            match sender {
                None => {
                    info!(
                        to = %cc_email,
                        subject = %subject,
                        total_maintainers = summary.total_maintainers,
                        total_repos = summary.total_repos,
                        total_stale_items = summary.total_stale_items,
                        "[DRY RUN] Would send summary email"
                    );
                    *sent_count += 1;
                }
                Some(sender) => {
                    match sender
                        .send_email(cc_email, &subject, &html_body, &text_body, &[])
                        .await
                    {
                        Ok(()) => {
                            info!(email = %cc_email, "Sent summary email to CC recipient");
                            *sent_count += 1;
                        }
                        Err(e) => {
                            error!(email = %cc_email, error = %e, "Failed to send summary email");
                            *failed_count += 1;
                        }
                    }
                }
            }
        }
    }
}
