pub mod bot;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod history;
pub mod logging;
pub mod models;
pub mod platform;


pub use config::AppConfig;
pub use errors::*;
