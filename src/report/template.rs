use super::types::*;
use crate::goals::{ActionItems, GoalsProgress};
use crate::models::Result;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Milliseconds to a readable duration: minutes below 1h, days above 48h.
pub fn format_duration(ms: f64) -> String {
    let hours = ms / 3_600_000.0;
    if hours < 1.0 {
        return format!("{:.0}m", ms / 60_000.0);
    }
    if hours >= 48.0 {
        return format!("{:.1}d", hours / 24.0);
    }
    format!("{:.1}h", hours)
}

/// Hours to a readable duration, switching to days above 48h.
pub fn format_hours(hours: i64) -> String {
    if hours >= 48 {
        return format!("{} days", hours / 24);
    }
    format!("{}h", hours)
}

pub fn format_trend(trend: &TrendMetrics) -> String {
    let arrow = match trend.direction {
        TrendDirection::Up => "↑",
        TrendDirection::Down => "↓",
        TrendDirection::Same => "→",
    };

    if trend.direction == TrendDirection::Same {
        return format!("{} No change", arrow);
    }

    format!("{} {} ({:.1}%)", arrow, trend.absolute, trend.percent)
}

pub fn format_percent_change(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{:.1}%", percent)
    } else if percent < 0.0 {
        format!("{:.1}%", percent)
    } else {
        "0%".to_string()
    }
}

/// 🔴 over 30 days, 🟡 7-30 days, ⚪ under a week.
pub fn urgency_indicator(days: i64) -> &'static str {
    if days > 30 {
        "🔴"
    } else if days >= 7 {
        "🟡"
    } else {
        "⚪"
    }
}

pub fn urgency_color(days: i64) -> &'static str {
    if days > 30 {
        "#d73a49"
    } else if days >= 7 {
        "#d97706"
    } else {
        "#6a737d"
    }
}

pub fn format_date(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d").to_string()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a maintainer's weekly report as an HTML document.
pub fn render_html_email(report: &EmailReport) -> Result<String> {
    let mut out = String::new();

    writeln!(
        out,
        "<!DOCTYPE html>\n<html>\n<body style=\"font-family: -apple-system, sans-serif; color: #24292e; max-width: 720px; margin: 0 auto;\">"
    )?;
    writeln!(
        out,
        "<h1>Weekly Repository Health Report</h1>\n<p>Hi {},</p>\n<p>Here is the weekly health report for your {} repositories, week ending <strong>{}</strong>.</p>",
        escape_html(&report.maintainer_name),
        report.total_repos,
        escape_html(&report.week_ending)
    )?;

    if report.total_repos > 1 {
        writeln!(
            out,
            "<p><strong>{}</strong> stale items and <strong>{}</strong> new contributors across all your repositories.</p>",
            report.total_stale, report.total_new_contributors
        )?;
    }

    if let Some(progress) = &report.goals_progress {
        render_goals_html(&mut out, progress)?;
    }

    for repo in &report.repos {
        render_repo_html(&mut out, repo)?;
    }

    writeln!(
        out,
        "<hr>\n<p style=\"color: #6a737d; font-size: 12px;\">Generated at {}.</p>\n</body>\n</html>",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    Ok(out)
}

fn render_repo_html(out: &mut String, repo: &RepoReport) -> Result<()> {
    writeln!(
        out,
        "<h2><a href=\"{}\">{}/{}</a></h2>",
        escape_html(&repo.dashboard_url),
        escape_html(&repo.org),
        escape_html(&repo.repo)
    )?;

    writeln!(out, "<table cellpadding=\"6\" style=\"border-collapse: collapse;\">")?;
    writeln!(
        out,
        "<tr><td>Open issues</td><td><strong>{}</strong></td><td>{}</td></tr>",
        repo.current_health.open_issues,
        format_trend(&repo.health_trend)
    )?;
    writeln!(
        out,
        "<tr><td>Open PRs</td><td><strong>{}</strong></td><td></td></tr>",
        repo.current_health.open_prs
    )?;
    writeln!(
        out,
        "<tr><td>Stale items</td><td><strong>{}</strong></td><td>{}</td></tr>",
        repo.current_stale.total_stale,
        format_trend(&repo.stale_trend)
    )?;
    writeln!(
        out,
        "<tr><td>Contributors</td><td><strong>{}</strong></td><td></td></tr>",
        repo.current_health.contributors
    )?;
    writeln!(
        out,
        "<tr><td>Avg issue response</td><td><strong>{}</strong></td><td></td></tr>",
        format_duration(repo.current_health.avg_issue_response_ms)
    )?;
    writeln!(
        out,
        "<tr><td>Avg PR response</td><td><strong>{}</strong></td><td></td></tr>",
        format_duration(repo.current_health.avg_pr_response_ms)
    )?;
    writeln!(
        out,
        "<tr><td>PR merge rate</td><td><strong>{:.1}%</strong></td><td></td></tr>",
        repo.current_health.pr_merge_rate
    )?;
    if let Some(coverage) = repo.current_health.coverage {
        writeln!(
            out,
            "<tr><td>Coverage</td><td><strong>{:.1}%</strong></td><td></td></tr>",
            coverage
        )?;
    }
    writeln!(out, "</table>")?;

    if !repo.new_contributors.is_empty() {
        writeln!(out, "<h3>New contributors 🎉</h3>\n<ul>")?;
        for contributor in &repo.new_contributors {
            writeln!(out, "<li>@{}</li>", escape_html(&contributor.username))?;
        }
        writeln!(out, "</ul>")?;
    }

    if !repo.stale_items.is_empty() {
        writeln!(
            out,
            "<h3>Stale items (<a href=\"{}\">dashboard</a>)</h3>\n<ul>",
            escape_html(&repo.stale_url)
        )?;
        for item in &repo.stale_items {
            writeln!(
                out,
                "<li>#{} [{}] {}</li>",
                item.number,
                escape_html(&item.item_type),
                escape_html(&item.title)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if let Some(action_items) = &repo.action_items {
        render_action_items_html(out, action_items)?;
    }

    writeln!(
        out,
        "<p><a href=\"{}\">Community health dashboard</a></p>",
        escape_html(&repo.community_health_url)
    )?;

    Ok(())
}

fn render_action_items_html(out: &mut String, items: &ActionItems) -> Result<()> {
    if items.total_items == 0 {
        writeln!(out, "<p>✅ No immediate action items.</p>")?;
        return Ok(());
    }

    writeln!(out, "<h3>Action items ({})</h3>", items.total_items)?;

    if !items.unresponded_issues.is_empty() {
        writeln!(out, "<h4>Issues awaiting first response</h4>\n<ul>")?;
        for issue in &items.unresponded_issues {
            writeln!(
                out,
                "<li>{} <a href=\"{}\">#{}</a> {} <span style=\"color: {};\">({} days, @{})</span></li>",
                urgency_indicator(issue.days_since),
                escape_html(&issue.url),
                issue.number,
                escape_html(&issue.title),
                urgency_color(issue.days_since),
                issue.days_since,
                escape_html(&issue.author)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !items.unreviewed_prs.is_empty() {
        writeln!(out, "<h4>PRs awaiting review</h4>\n<ul>")?;
        for pr in &items.unreviewed_prs {
            writeln!(
                out,
                "<li>{} <a href=\"{}\">#{}</a> {} <span style=\"color: {};\">({} days, @{})</span></li>",
                urgency_indicator(pr.days_since),
                escape_html(&pr.url),
                pr.number,
                escape_html(&pr.title),
                urgency_color(pr.days_since),
                pr.days_since,
                escape_html(&pr.author)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !items.failing_branches.is_empty() {
        writeln!(out, "<h4>Failing default branches</h4>\n<ul>")?;
        for branch in &items.failing_branches {
            writeln!(
                out,
                "<li>🔴 <a href=\"{}\">{}</a> is <strong>{}</strong> (<a href=\"{}\">checks</a>)</li>",
                escape_html(&branch.url),
                escape_html(&branch.branch),
                escape_html(&branch.status),
                escape_html(&branch.checks_url)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !items.approved_prs_ready_to_merge.is_empty() {
        writeln!(out, "<h4>Approved PRs ready to merge</h4>\n<ul>")?;
        for pr in &items.approved_prs_ready_to_merge {
            writeln!(
                out,
                "<li>✅ <a href=\"{}\">#{}</a> {} ({} approvals, waiting {} days)</li>",
                escape_html(&pr.url),
                pr.number,
                escape_html(&pr.title),
                pr.approval_count,
                pr.days_since
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !items.external_contributor_prs.is_empty() {
        writeln!(out, "<h4>External contributor PRs</h4>\n<ul>")?;
        for pr in &items.external_contributor_prs {
            let badge = if pr.is_first_time {
                " 🌟 first-time contributor"
            } else {
                ""
            };
            writeln!(
                out,
                "<li><a href=\"{}\">#{}</a> {} (@{}, waiting {} days{})</li>",
                escape_html(&pr.url),
                pr.number,
                escape_html(&pr.title),
                escape_html(&pr.author),
                pr.days_waiting,
                badge
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !items.prs_awaiting_author_response.is_empty() {
        writeln!(out, "<h4>PRs awaiting author response</h4>\n<ul>")?;
        for pr in &items.prs_awaiting_author_response {
            writeln!(
                out,
                "<li><a href=\"{}\">#{}</a> {} (changes requested by @{} on {}, {} days ago)</li>",
                escape_html(&pr.url),
                pr.number,
                escape_html(&pr.title),
                escape_html(&pr.reviewer),
                format_date(pr.requested_at),
                pr.days_since_request
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    Ok(())
}

fn render_goals_html(out: &mut String, progress: &GoalsProgress) -> Result<()> {
    writeln!(out, "<h2>Community goals</h2>\n<table cellpadding=\"6\" style=\"border-collapse: collapse;\">")?;
    writeln!(
        out,
        "<tr><td>30-day activity</td><td><strong>{:.1}%</strong></td><td>{}</td></tr>",
        progress.thirty_day_activity.compliance_rate, progress.thirty_day_activity.status
    )?;
    writeln!(
        out,
        "<tr><td>Backlog cleanup</td><td><strong>{}</strong> of {:.0}% target</td><td>{} ({})</td></tr>",
        format_percent_change(progress.backlog_cleanup.reduction_percent),
        progress.backlog_cleanup.target,
        progress.backlog_cleanup.status,
        escape_html(&progress.backlog_cleanup.time_remaining)
    )?;
    writeln!(
        out,
        "<tr><td>Triage speed</td><td><strong>{:.1}%</strong></td><td>{}</td></tr>",
        progress.triage_speed.triage_rate, progress.triage_speed.status
    )?;
    writeln!(
        out,
        "<tr><td>Ownership files</td><td><strong>{:.1}%</strong></td><td>{}</td></tr>",
        progress.ownership_updates.compliance_rate, progress.ownership_updates.status
    )?;
    writeln!(out, "</table>")?;

    if !progress.triage_speed.untriaged_list.is_empty() {
        writeln!(out, "<h3>Untriaged issues</h3>\n<ul>")?;
        for issue in &progress.triage_speed.untriaged_list {
            writeln!(
                out,
                "<li><a href=\"{}\">{}/{}#{}</a> {} (open {})</li>",
                escape_html(&issue.url),
                escape_html(&issue.org),
                escape_html(&issue.repo),
                issue.number,
                escape_html(&issue.title),
                format_hours(issue.hours_open)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    Ok(())
}

/// Plain-text alternative body for the maintainer report.
pub fn render_text_email(report: &EmailReport) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "WEEKLY REPOSITORY HEALTH REPORT")?;
    writeln!(out, "Week ending {}", report.week_ending)?;
    writeln!(out)?;
    writeln!(out, "Hi {},", report.maintainer_name)?;
    writeln!(out)?;

    if report.total_repos > 1 {
        writeln!(
            out,
            "{} stale items and {} new contributors across your {} repositories.",
            report.total_stale, report.total_new_contributors, report.total_repos
        )?;
        writeln!(out)?;
    }

    if let Some(progress) = &report.goals_progress {
        writeln!(out, "COMMUNITY GOALS")?;
        writeln!(
            out,
            "  30-day activity:  {:.1}% [{}]",
            progress.thirty_day_activity.compliance_rate, progress.thirty_day_activity.status
        )?;
        writeln!(
            out,
            "  Backlog cleanup:  {} of {:.0}% target [{}] ({})",
            format_percent_change(progress.backlog_cleanup.reduction_percent),
            progress.backlog_cleanup.target,
            progress.backlog_cleanup.status,
            progress.backlog_cleanup.time_remaining
        )?;
        writeln!(
            out,
            "  Triage speed:     {:.1}% [{}]",
            progress.triage_speed.triage_rate, progress.triage_speed.status
        )?;
        writeln!(
            out,
            "  Ownership files:  {:.1}% [{}]",
            progress.ownership_updates.compliance_rate, progress.ownership_updates.status
        )?;
        for issue in &progress.triage_speed.untriaged_list {
            writeln!(
                out,
                "    - untriaged {}/{}#{} (open {}): {}",
                issue.org,
                issue.repo,
                issue.number,
                format_hours(issue.hours_open),
                issue.title
            )?;
        }
        writeln!(out)?;
    }

    for repo in &report.repos {
        writeln!(out, "== {}/{} ==", repo.org, repo.repo)?;
        writeln!(
            out,
            "  Open issues:        {} ({})",
            repo.current_health.open_issues,
            format_trend(&repo.health_trend)
        )?;
        writeln!(out, "  Open PRs:           {}", repo.current_health.open_prs)?;
        writeln!(
            out,
            "  Stale items:        {} ({})",
            repo.current_stale.total_stale,
            format_trend(&repo.stale_trend)
        )?;
        writeln!(
            out,
            "  Avg issue response: {}",
            format_duration(repo.current_health.avg_issue_response_ms)
        )?;
        writeln!(
            out,
            "  Avg PR response:    {}",
            format_duration(repo.current_health.avg_pr_response_ms)
        )?;
        writeln!(
            out,
            "  PR merge rate:      {:.1}%",
            repo.current_health.pr_merge_rate
        )?;

        if !repo.new_contributors.is_empty() {
            let names: Vec<&str> = repo
                .new_contributors
                .iter()
                .map(|c| c.username.as_str())
                .collect();
            writeln!(out, "  New contributors:   {}", names.join(", "))?;
        }

        if let Some(action_items) = &repo.action_items {
            if action_items.total_items > 0 {
                writeln!(out, "  Action items:       {}", action_items.total_items)?;
                for issue in &action_items.unresponded_issues {
                    writeln!(
                        out,
                        "    - unanswered issue #{} ({} days): {}",
                        issue.number, issue.days_since, issue.title
                    )?;
                }
                for pr in &action_items.unreviewed_prs {
                    writeln!(
                        out,
                        "    - unreviewed PR #{} ({} days): {}",
                        pr.number, pr.days_since, pr.title
                    )?;
                }
                for branch in &action_items.failing_branches {
                    writeln!(
                        out,
                        "    - failing branch {}: {}",
                        branch.branch, branch.status
                    )?;
                }
            }
        }

        writeln!(out, "  Dashboards: {} | {}", repo.stale_url, repo.community_health_url)?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "Generated at {}.",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    Ok(out)
}

/// HTML body for the team-wide summary sent to CC recipients.
pub fn render_summary_html_email(summary: &SummaryEmailReport) -> Result<String> {
    let mut out = String::new();

    writeln!(
        out,
        "<!DOCTYPE html>\n<html>\n<body style=\"font-family: -apple-system, sans-serif; color: #24292e; max-width: 720px; margin: 0 auto;\">"
    )?;
    writeln!(
        out,
        "<h1>Team Health Summary</h1>\n<p>Week ending <strong>{}</strong>.</p>",
        escape_html(&summary.week_ending)
    )?;

    writeln!(out, "<table cellpadding=\"6\" style=\"border-collapse: collapse;\">")?;
    writeln!(
        out,
        "<tr><td>Maintainers</td><td><strong>{}</strong></td></tr>",
        summary.total_maintainers
    )?;
    writeln!(
        out,
        "<tr><td>Repositories</td><td><strong>{}</strong></td></tr>",
        summary.total_repos
    )?;
    writeln!(
        out,
        "<tr><td>Open issues</td><td><strong>{}</strong></td></tr>",
        summary.total_open_issues
    )?;
    writeln!(
        out,
        "<tr><td>Open PRs</td><td><strong>{}</strong></td></tr>",
        summary.total_open_prs
    )?;
    writeln!(
        out,
        "<tr><td>Stale items</td><td><strong>{}</strong></td></tr>",
        summary.total_stale_items
    )?;
    writeln!(
        out,
        "<tr><td>New contributors</td><td><strong>{}</strong></td></tr>",
        summary.total_new_contributors
    )?;
    writeln!(out, "</table>")?;

    if let Some(progress) = &summary.goals_progress {
        render_goals_html(&mut out, progress)?;
    }

    writeln!(out, "<h2>Maintainers</h2>\n<table cellpadding=\"6\" style=\"border-collapse: collapse;\">")?;
    writeln!(
        out,
        "<tr><th align=\"left\">Maintainer</th><th align=\"left\">Repositories</th><th align=\"left\">Stale items</th></tr>"
    )?;
    for maintainer in &summary.maintainers {
        writeln!(
            out,
            "<tr><td>{} ({})</td><td>{}</td><td>{}</td></tr>",
            escape_html(&maintainer.name),
            escape_html(&maintainer.email),
            escape_html(&maintainer.repositories.join(", ")),
            maintainer.stale_items
        )?;
    }
    writeln!(out, "</table>")?;

    if !summary.top_unresponded_issues.is_empty() {
        writeln!(out, "<h2>Oldest unanswered issues</h2>\n<ul>")?;
        for issue in &summary.top_unresponded_issues {
            writeln!(
                out,
                "<li>{} <a href=\"{}\">{}/{}#{}</a> {} ({} days)</li>",
                urgency_indicator(issue.days_since),
                escape_html(&issue.url),
                escape_html(&issue.org),
                escape_html(&issue.repo),
                issue.number,
                escape_html(&issue.title),
                issue.days_since
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    if !summary.top_unreviewed_prs.is_empty() {
        writeln!(out, "<h2>Oldest unreviewed PRs</h2>\n<ul>")?;
        for pr in &summary.top_unreviewed_prs {
            writeln!(
                out,
                "<li>{} <a href=\"{}\">{}/{}#{}</a> {} ({} days)</li>",
                urgency_indicator(pr.days_since),
                escape_html(&pr.url),
                escape_html(&pr.org),
                escape_html(&pr.repo),
                pr.number,
                escape_html(&pr.title),
                pr.days_since
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    writeln!(
        out,
        "<hr>\n<p style=\"color: #6a737d; font-size: 12px;\">Generated at {}.</p>\n</body>\n</html>",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    Ok(out)
}

/// Plain-text alternative body for the summary email.
pub fn render_summary_text_email(summary: &SummaryEmailReport) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "TEAM HEALTH SUMMARY")?;
    writeln!(out, "Week ending {}", summary.week_ending)?;
    writeln!(out)?;
    writeln!(out, "Maintainers:      {}", summary.total_maintainers)?;
    writeln!(out, "Repositories:     {}", summary.total_repos)?;
    writeln!(out, "Open issues:      {}", summary.total_open_issues)?;
    writeln!(out, "Open PRs:         {}", summary.total_open_prs)?;
    writeln!(out, "Stale items:      {}", summary.total_stale_items)?;
    writeln!(out, "New contributors: {}", summary.total_new_contributors)?;
    writeln!(out)?;

    writeln!(out, "PER MAINTAINER (most stale first)")?;
    for maintainer in &summary.maintainers {
        writeln!(
            out,
            "  {} <{}>: {} repos, {} stale items ({})",
            maintainer.name,
            maintainer.email,
            maintainer.repo_count,
            maintainer.stale_items,
            maintainer.repositories.join(", ")
        )?;
    }
    writeln!(out)?;

    if !summary.top_unresponded_issues.is_empty() {
        writeln!(out, "OLDEST UNANSWERED ISSUES")?;
        for issue in &summary.top_unresponded_issues {
            writeln!(
                out,
                "  {}/{}#{} ({} days): {}",
                issue.org, issue.repo, issue.number, issue.days_since, issue.title
            )?;
        }
        writeln!(out)?;
    }

    if !summary.top_unreviewed_prs.is_empty() {
        writeln!(out, "OLDEST UNREVIEWED PRS")?;
        for pr in &summary.top_unreviewed_prs {
            writeln!(
                out,
                "  {}/{}#{} ({} days): {}",
                pr.org, pr.repo, pr.number, pr.days_since, pr.title
            )?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "Generated at {}.",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    Ok(out)
}
