//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::config::parse_list;
use crate::AppConfig;

#[derive(Parser)]
#[command(name = "tonkbot")]
#[command(about = "Tonkotsu Police: spots the tonkatsu/tonkotsu mix-up on Reddit")]
#[command(version)]
pub struct Cli {
    /// Config file (default: tonkbot.toml, then config.example.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the title classifier from a labeled dataset
    Train(TrainArgs),
    /// Scan for the misspelling, answer summons and purge downvoted comments
    Run(RunArgs),
}

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Labeled data file
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,
    /// Where to write the model bundle
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Which subreddits to train on (comma separated)
    #[arg(short = 's', long = "subreddits", value_name = "LIST")]
    pub subreddits: Option<String>,
    /// Test data output file
    #[arg(short = 't', long, value_name = "FILE")]
    pub test_out: Option<PathBuf>,
    /// Fraction of the data held out for testing
    #[arg(short = 'r', long, value_name = "FLOAT")]
    pub test_split: Option<f64>,
    /// Seed for the train/test shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.training.data = data.clone();
        }
        if let Some(out) = &self.out {
            config.paths.model = out.clone();
        }
        if let Some(list) = &self.subreddits {
            config.training.communities = parse_list(list);
        }
        if let Some(test_out) = &self.test_out {
            config.training.test_out = test_out.clone();
        }
        if let Some(split) = self.test_split {
            config.training.test_split = split;
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Bot comment template file
    #[arg(short, long, value_name = "FILE")]
    pub comment: Option<PathBuf>,
    /// Debug logging
    #[arg(short = 'D', long)]
    pub debug: bool,
    /// Deleted comments file
    #[arg(short, long, value_name = "FILE")]
    pub deleted: Option<PathBuf>,
    /// Log file
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,
    /// Model bundle for classifying titles
    #[arg(short, long, value_name = "FILE")]
    pub model: Option<PathBuf>,
    /// Previously assessed posts file
    #[arg(short, long, value_name = "FILE")]
    pub posts: Option<PathBuf>,
    /// Subreddits to comment in (comma separated)
    #[arg(short = 's', long = "subreddits", value_name = "LIST")]
    pub subreddits: Option<String>,
    /// Repeat the pass every SECS seconds instead of running once
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

impl RunArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(comment) = &self.comment {
            config.paths.comment = comment.clone();
        }
        if let Some(deleted) = &self.deleted {
            config.paths.deleted = deleted.clone();
        }
        if let Some(log) = &self.log {
            config.paths.log = log.clone();
        }
        if let Some(model) = &self.model {
            config.paths.model = model.clone();
        }
        if let Some(posts) = &self.posts {
            config.paths.history = posts.clone();
        }
        if let Some(list) = &self.subreddits {
            config.bot.allowed_communities = parse_list(list);
        }
    }
}
