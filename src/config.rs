use crate::models::{RepoKey, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal configuration problems. These abort the run before any network
/// activity happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("issue_response_time_hours must be >= 1 (got {0})")]
    InvalidIssueResponseTime(i64),

    #[error("pr_review_wait_hours must be >= 1 (got {0})")]
    InvalidPrReviewWait(i64),

    #[error("pr_awaiting_author_response_days must be >= 1 (got {0})")]
    InvalidPrAwaitingAuthorDays(i64),

    #[error("SMTP_USERNAME and SMTP_PASSWORD environment variables must be set")]
    MissingSmtpCredentials,

    #[error("no maintainers configured")]
    NoMaintainers,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MaintainerConfig {
    pub maintainers: Vec<Maintainer>,

    #[serde(default)]
    pub cc_emails: Vec<String>,

    pub smtp: SmtpConfig,

    #[serde(default)]
    pub goals: Option<GoalsConfig>,

    #[serde(default)]
    pub action_items: Option<ActionItemsConfig>,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Maintainer {
    pub org: String,
    pub repo: String,
    pub email: String,
    pub name: String,
}

impl Maintainer {
    pub fn repo_key(&self) -> RepoKey {
        RepoKey::new(self.org.clone(), self.repo.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoalsConfig {
    pub enabled: bool,

    #[serde(default)]
    pub backlog_baseline: i64,

    /// Date the backlog baseline was captured, YYYY-MM-DD.
    #[serde(default)]
    pub backlog_baseline_date: String,

    /// Filenames whose presence counts as ownership documentation.
    #[serde(default)]
    pub ownership_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionItemsConfig {
    pub enabled: bool,

    pub issue_response_time_hours: i64,
    pub pr_review_wait_hours: i64,

    #[serde(default)]
    pub check_default_branch_ci: bool,
    #[serde(default)]
    pub check_approved_prs: bool,
    #[serde(default)]
    pub check_external_contributors: bool,
    #[serde(default)]
    pub check_prs_awaiting_author: bool,

    #[serde(default)]
    pub pr_awaiting_author_response_days: i64,
}

impl ActionItemsConfig {
    /// Threshold validation is eager and fatal. Zero-value cutoffs would flag
    /// every item in every repo, so refuse them before any network call.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.issue_response_time_hours <= 0 {
            return Err(ConfigError::InvalidIssueResponseTime(
                self.issue_response_time_hours,
            ));
        }
        if self.pr_review_wait_hours <= 0 {
            return Err(ConfigError::InvalidPrReviewWait(self.pr_review_wait_hours));
        }
        if self.check_prs_awaiting_author && self.pr_awaiting_author_response_days <= 0 {
            return Err(ConfigError::InvalidPrAwaitingAuthorDays(
                self.pr_awaiting_author_response_days,
            ));
        }
        Ok(())
    }
}

/// Where the dashboard snapshot archives live and where the published
/// dashboards can be linked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    pub community_health_dir: String,
    pub stale_dir: String,
    pub dashboard_base_url: String,
    pub days: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            community_health_dir: "community-health-dashboard/data/history".to_string(),
            stale_dir: "stale-dashboard/data/history".to_string(),
            dashboard_base_url: "https://konveyor.github.io/release-tools".to_string(),
            days: 14,
        }
    }
}

impl MaintainerConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.maintainers.is_empty() {
            return Err(ConfigError::NoMaintainers);
        }
        if let Some(action_items) = &self.action_items {
            action_items.validate()?;
        }
        Ok(())
    }

    pub fn goals_enabled(&self) -> bool {
        self.goals.as_ref().map(|g| g.enabled).unwrap_or(false)
    }

    pub fn action_items_enabled(&self) -> bool {
        self.action_items
            .as_ref()
            .map(|a| a.enabled)
            .unwrap_or(false)
    }
}

pub async fn load_maintainer_config(path: &str) -> Result<MaintainerConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: MaintainerConfig = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_items() -> ActionItemsConfig {
        ActionItemsConfig {
            enabled: true,
            issue_response_time_hours: 24,
            pr_review_wait_hours: 48,
            check_default_branch_ci: true,
            check_approved_prs: true,
            check_external_contributors: true,
            check_prs_awaiting_author: true,
            pr_awaiting_author_response_days: 3,
        }
    }

    #[test]
    fn valid_thresholds_pass() {
        assert!(action_items().validate().is_ok());
    }

    #[test]
    fn zero_issue_threshold_is_fatal() {
        let mut cfg = action_items();
        cfg.issue_response_time_hours = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidIssueResponseTime(0))
        ));
    }

    #[test]
    fn negative_review_threshold_is_fatal() {
        let mut cfg = action_items();
        cfg.pr_review_wait_hours = -1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPrReviewWait(-1))
        ));
    }

    #[test]
    fn awaiting_author_threshold_only_checked_when_enabled() {
        let mut cfg = action_items();
        cfg.pr_awaiting_author_response_days = 0;
        assert!(cfg.validate().is_err());

        cfg.check_prs_awaiting_author = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn disabled_config_skips_validation() {
        let mut cfg = action_items();
        cfg.enabled = false;
        cfg.issue_response_time_hours = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
maintainers:
  - org: konveyor
    repo: tackle2-hub
    email: dev@example.com
    name: Dev
smtp:
  server: smtp.example.com
  port: 587
  from_email: bot@example.com
  from_name: Health Bot
"#;
        let config: MaintainerConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.days, 14);
        assert!(!config.goals_enabled());
        assert!(!config.action_items_enabled());
    }
}
