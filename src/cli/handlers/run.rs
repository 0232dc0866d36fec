//! Bot runner handler

use std::time::Duration;

use tracing::error;
use tracing::info;

use crate::bot::Bot;
use crate::classifier::Classifier;
use crate::cli::output::print_info;
use crate::cli::output::print_run_summary;
use crate::errors::TonkbotError;
use crate::models::RunSummary;
use crate::platform::RedditClient;
use crate::AppConfig;
use crate::Result;

/// Fail fast when any file the bot reads is absent
pub fn check_required_files(config: &AppConfig) -> Result<()> {
    let paths = &config.paths;
    for path in [&paths.history, &paths.deleted, &paths.model, &paths.comment] {
        if !path.is_file() {
            return Err(TonkbotError::MissingFile(path.clone()));
        }
    }
    Ok(())
}

/// Log in and run every scan once
async fn run_pass(config: &AppConfig, classifier: &Classifier) -> Result<RunSummary> {
    let client = RedditClient::login(&config.reddit).await?;
    let mut bot = Bot::new(config, &client, classifier)?;
    let summary = bot.run_once().await?;
    info!("Logging off.");
    Ok(summary)
}

pub async fn handle_run_command(config: &AppConfig, interval: Option<u64>) -> Result<()> {
    config.validate_bot()?;
    let classifier = Classifier::load(&config.paths.model, config.bot.strict_integrity)?;

    let Some(secs) = interval else {
        let summary = run_pass(config, &classifier).await?;
        print_run_summary(&summary);
        return Ok(());
    };

    let period = Duration::from_secs(secs.max(1));
    print_info(&format!("Running every {}s, press Ctrl-C to stop", period.as_secs()));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_pass(config, &classifier).await {
                    Ok(summary) => print_run_summary(&summary),
                    Err(e) => error!("Pass failed: {e}; retrying in {}s", period.as_secs()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}
