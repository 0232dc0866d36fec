//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the tonkbot CLI

use crate::classifier::trainer::ConfusionMatrix;
use crate::models::RunSummary;

/// Print the held-out accuracy and confusion matrix of a training run
pub fn print_training_report(accuracy_percent: f64, n_train: usize, n_test: usize, confusion: &ConfusionMatrix) {
    println!("📊 Trained on {n_train} titles, tested on {n_test}");
    println!("Model accuracy: {accuracy_percent}%");
    println!("{confusion}");
}

/// Print the tallies of one bot pass
pub fn print_run_summary(summary: &RunSummary) {
    println!(
        "📋 Assessed {} post{}, commented on {}, answered {} summon{}, removed {} comment{}",
        summary.assessed,
        if summary.assessed == 1 { "" } else { "s" },
        summary.commented,
        summary.summons_answered,
        if summary.summons_answered == 1 { "" } else { "s" },
        summary.comments_removed,
        if summary.comments_removed == 1 { "" } else { "s" },
    );
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}
