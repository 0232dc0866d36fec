use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TonkbotError {
    #[error("File: \"{}\" not found", .0.display())]
    MissingFile(PathBuf),

    #[error("Data file \"{}\" not found.", .0.display())]
    MissingDataFile(PathBuf),

    #[error("Saved and test model accuracy do not match: recorded {recorded}, recomputed {recomputed}")]
    ModelIntegrity { recorded: f64, recomputed: f64 },

    #[error("Unsupported model format version {found} (expected {expected})")]
    UnsupportedModelVersion { found: u32, expected: u32 },

    #[error("Corrupt model bundle: {0}")]
    CorruptModel(String),

    #[error("Model error: {0}")]
    Model(#[from] smartcore::error::Failed),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Malformed history line {line}: {reason}")]
    MalformedHistory { line: usize, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TonkbotError>;
