use std::process::ExitCode;

use clap::Parser;
use tonkbot::cli::check_required_files;
use tonkbot::cli::handle_run_command;
use tonkbot::cli::handle_train_command;
use tonkbot::cli::Cli;
use tonkbot::cli::Commands;
use tonkbot::logging::init_logging;
use tonkbot::AppConfig;
use tonkbot::Result;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Train(args) => {
            args.apply(&mut config);
            let _guard = init_logging(&config.logging, None, false)?;
            handle_train_command(&config)
        }
        Commands::Run(args) => {
            args.apply(&mut config);
            check_required_files(&config)?;
            let _guard = init_logging(&config.logging, Some(&config.paths.log), args.debug)?;
            handle_run_command(&config, args.interval).await
        }
    }
}
