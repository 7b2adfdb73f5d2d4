use crate::models::Result;
use crate::report::ReportOptions;
use clap::Parser;

/// Weekly repository health report generator.
#[derive(Debug, Parser)]
#[command(name = "weekly-email", version, about = "Generate and send weekly repository health reports")]
pub struct Cli {
    /// Path to the maintainers configuration file.
    #[arg(long, default_value = "config/maintainers.yaml")]
    pub maintainers: String,

    /// Actually send emails (required for production).
    #[arg(long)]
    pub confirm: bool,

    /// Generate emails but don't send them.
    #[arg(long, conflicts_with = "confirm")]
    pub dry_run: bool,

    /// Output a single email HTML to stdout and exit.
    #[arg(long, conflicts_with_all = ["confirm", "dry_run"])]
    pub preview: bool,

    /// Filter to a specific maintainer email (for testing).
    #[arg(long)]
    pub email: Option<String>,

    /// Filter to a specific repository org/repo (for testing).
    #[arg(long)]
    pub repo: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// One mode is mandatory; running with no mode at all would silently do
    /// nothing useful.
    pub fn validate(&self) -> Result<()> {
        if !self.confirm && !self.dry_run && !self.preview {
            return Err("must specify either --confirm, --dry-run, or --preview".into());
        }
        Ok(())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            dry_run: self.dry_run,
            preview: self.preview,
            filter_email: self.email.clone(),
            filter_repo: self.repo.clone(),
        }
    }
}
