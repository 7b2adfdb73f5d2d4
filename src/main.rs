use clap::Parser;
use health_reporter::cli::Cli;
use health_reporter::config::load_maintainer_config;
use health_reporter::github::GithubApi;
use health_reporter::models::Result;
use health_reporter::report::Reporter;
use health_reporter::wait;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let directive = format!("health_reporter={},hyper=warn,octocrab=warn", cli.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .init();

    info!("Starting weekly email report tool");

    cli.validate()?;

    info!(path = %cli.maintainers, "Loading maintainer configuration");
    let config = load_maintainer_config(&cli.maintainers).await?;

    info!(
        maintainers = config.maintainers.len(),
        cc_emails = config.cc_emails.len(),
        smtp_server = %config.smtp.server,
        "Maintainer configuration loaded"
    );

    let client = Arc::new(GithubApi::from_env()?);
    let (cancel_handle, cancel_signal) = wait::channel();

    let reporter = Reporter::new(client, cancel_signal);
    let options = cli.report_options();

    tokio::select! {
        result = reporter.generate_and_send_weekly_reports(&config, &options) => {
            if let Err(e) = result {
                error!(error = %e, "Failed to generate and send weekly reports");
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            cancel_handle.cancel();
            return Ok(());
        }
    }

    if cli.dry_run {
        info!("Dry run completed successfully");
    } else if cli.preview {
        info!("Preview completed successfully");
    } else {
        info!("Weekly reports sent successfully");
    }

    Ok(())
}
