//! Labeled title dataset

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::errors::TonkbotError;
use crate::Result;

/// A post title labeled by hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub title: String,
    /// True when the title misuses the target term
    pub label: bool,
    pub community: String,
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    title: String,
    label: u8,
    #[serde(alias = "sub", alias = "subreddit")]
    community: String,
}

/// Read a tab-separated dataset with a header row
///
/// Columns are matched by header name; extra columns are ignored.
pub fn read_dataset(path: &Path) -> Result<Vec<LabeledExample>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut examples = Vec::new();
    for (index, row) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = row?;
        let label = match row.label {
            0 => false,
            1 => true,
            other => {
                return Err(TonkbotError::Dataset(format!(
                    "row {}: label must be 0 or 1, got {other}",
                    index + 1
                )))
            }
        };
        examples.push(LabeledExample {
            title: row.title,
            label,
            community: row.community,
        });
    }
    Ok(examples)
}

/// Keep only examples from the listed communities
pub fn filter_communities(examples: Vec<LabeledExample>, communities: &[String]) -> Vec<LabeledExample> {
    examples
        .into_iter()
        .filter(|example| communities.iter().any(|c| *c == example.community))
        .collect()
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_split)` indices
///
/// Returns `(train, test)` index lists.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn train_test_split(n: usize, test_split: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64) * test_split).ceil() as usize;
    let n_test = n_test.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    (train, indices)
}
