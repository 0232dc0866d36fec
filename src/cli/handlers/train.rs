//! Training handler

use crate::classifier::trainer;
use crate::classifier::TrainingOptions;
use crate::cli::output::print_success;
use crate::cli::output::print_training_report;
use crate::cli::output::print_warning;
use crate::AppConfig;
use crate::Result;

pub fn handle_train_command(config: &AppConfig) -> Result<()> {
    config.validate_training()?;
    let options = TrainingOptions::from_config(config);

    let outcome = trainer::run(&options)?;

    if outcome.held_out.is_empty() {
        print_warning("No titles were held out, accuracy is not meaningful");
    }
    print_training_report(
        outcome.accuracy_percent(),
        outcome.n_train,
        outcome.held_out.len(),
        &outcome.confusion,
    );
    print_success(&format!(
        "Saved model to {} and test data to {}",
        options.out.display(),
        options.test_out.display()
    ));
    Ok(())
}
