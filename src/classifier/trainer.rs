//! Offline training pipeline: dataset in, classifier bundle out

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::info;
use tracing::warn;

use super::bundle::ClassifierBundle;
use super::bundle::HeldOut;
use super::dataset::filter_communities;
use super::dataset::read_dataset;
use super::dataset::train_test_split;
use super::dataset::LabeledExample;
use super::naive_bayes::MultinomialNb;
use super::normalize::Normalizer;
use super::vectorizer::FeatureVectorizer;
use crate::errors::TonkbotError;
use crate::history::single_line;
use crate::Result;

/// Inputs of one training run
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub data: PathBuf,
    pub out: PathBuf,
    pub communities: Vec<String>,
    pub test_out: PathBuf,
    pub test_split: f64,
    pub seed: u64,
    pub target_term: String,
}

impl TrainingOptions {
    pub fn from_config(config: &crate::AppConfig) -> Self {
        Self {
            data: config.training.data.clone(),
            out: config.paths.model.clone(),
            communities: config.training.communities.clone(),
            test_out: config.training.test_out.clone(),
            test_split: config.training.test_split,
            seed: config.training.seed,
            target_term: config.target_term(),
        }
    }
}

/// Counts of held-out predictions, rows actual and columns predicted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
                (true, true) => matrix.true_positive += 1,
            }
        }
        matrix
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "               predicted 0  predicted 1")?;
        writeln!(
            f,
            "actual 0  {:>13}  {:>11}",
            self.true_negative, self.false_positive
        )?;
        write!(
            f,
            "actual 1  {:>13}  {:>11}",
            self.false_negative, self.true_positive
        )
    }
}

/// Result of fitting a bundle on a dataset
#[derive(Debug)]
pub struct TrainingOutcome {
    pub bundle: ClassifierBundle,
    pub n_train: usize,
    /// Held-out examples with the model's prediction for each
    pub held_out: Vec<(LabeledExample, bool)>,
    pub confusion: ConfusionMatrix,
}

impl TrainingOutcome {
    pub fn accuracy(&self) -> f64 {
        self.bundle.accuracy
    }

    /// Accuracy as a percentage rounded to one decimal
    pub fn accuracy_percent(&self) -> f64 {
        (self.bundle.accuracy * 1000.0).round() / 10.0
    }
}

/// Normalize, split, vectorize and fit
pub fn fit_bundle(
    examples: &[LabeledExample],
    target_term: &str,
    test_split: f64,
    seed: u64,
) -> Result<TrainingOutcome> {
    let normalizer = Normalizer::new(target_term);
    let titles: Vec<String> = examples
        .iter()
        .map(|example| normalizer.normalize(&example.title))
        .collect();

    let (train_idx, test_idx) = train_test_split(examples.len(), test_split, seed);
    if train_idx.is_empty() {
        return Err(TonkbotError::Dataset(format!(
            "no training rows left out of {} after the split",
            examples.len()
        )));
    }

    let pick_titles = |indices: &[usize]| -> Vec<&str> {
        indices.iter().map(|&i| titles[i].as_str()).collect()
    };
    let pick_labels =
        |indices: &[usize]| -> Vec<bool> { indices.iter().map(|&i| examples[i].label).collect() };

    info!("Extracting features");
    let (x_train, vectorizer) = FeatureVectorizer::fit(&pick_titles(&train_idx));
    let x_test = vectorizer.transform(&pick_titles(&test_idx));
    let y_train = pick_labels(&train_idx);
    let y_test = pick_labels(&test_idx);

    info!("Training model on {} titles", train_idx.len());
    let model = MultinomialNb::fit(&x_train, &y_train)?;

    info!("Testing model on {} titles", test_idx.len());
    if test_idx.is_empty() {
        warn!("Held-out split is empty; recorded accuracy will be 0");
    }
    let predictions = model.predict(&x_test)?;
    let accuracy = model.score(&x_test, &y_test)?;
    let confusion = ConfusionMatrix::from_predictions(&y_test, &predictions);

    let held_out = test_idx
        .iter()
        .zip(&predictions)
        .map(|(&i, &predicted)| (examples[i].clone(), predicted))
        .collect();

    let bundle = ClassifierBundle::new(
        target_term,
        model,
        vectorizer,
        HeldOut {
            features: x_test,
            labels: y_test,
        },
        accuracy,
    );

    Ok(TrainingOutcome {
        bundle,
        n_train: train_idx.len(),
        held_out,
        confusion,
    })
}

/// Write `Actual\tPredicted\tTitle` lines, replacing any previous file
pub fn write_test_data(path: &Path, held_out: &[(LabeledExample, bool)]) -> Result<()> {
    if path.exists() {
        info!("Removing previous test data file");
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "Actual\tPredicted\tTitle")?;
    for (example, predicted) in held_out {
        writeln!(
            writer,
            "{}\t{}\t{}",
            u8::from(example.label),
            u8::from(*predicted),
            single_line(&example.title)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Run the whole pipeline described by `options`
pub fn run(options: &TrainingOptions) -> Result<TrainingOutcome> {
    if !options.data.is_file() {
        return Err(TonkbotError::MissingDataFile(options.data.clone()));
    }

    let examples = read_dataset(&options.data)?;
    let total = examples.len();
    let examples = filter_communities(examples, &options.communities);
    info!(
        "Read {total} labeled titles, {} from {}",
        examples.len(),
        options.communities.join(",")
    );

    let outcome = fit_bundle(
        &examples,
        &options.target_term,
        options.test_split,
        options.seed,
    )?;
    info!("Model accuracy: {}%", outcome.accuracy_percent());

    info!("Saving test data to {}", options.test_out.display());
    write_test_data(&options.test_out, &outcome.held_out)?;

    info!("Saving model to {}", options.out.display());
    outcome.bundle.save(&options.out)?;

    Ok(outcome)
}
