//! Versioned on-disk classifier artifact

use std::path::Path;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::naive_bayes::MultinomialNb;
use super::normalize::Normalizer;
use super::vectorizer::FeatureMatrix;
use super::vectorizer::FeatureVectorizer;
use crate::errors::TonkbotError;
use crate::models::Prediction;
use crate::Result;

/// Bumped whenever the bundle layout changes incompatibly
pub const FORMAT_VERSION: u32 = 1;

/// Held-out rows kept so a loaded bundle can check itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldOut {
    pub features: FeatureMatrix,
    pub labels: Vec<bool>,
}

/// Everything needed to classify titles exactly as at training time
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierBundle {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    /// Term the normalizer strips from titles
    pub target_term: String,
    pub model: MultinomialNb,
    pub vectorizer: FeatureVectorizer,
    pub held_out: HeldOut,
    /// Held-out accuracy recorded at training time
    pub accuracy: f64,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl ClassifierBundle {
    pub fn new(
        target_term: &str,
        model: MultinomialNb,
        vectorizer: FeatureVectorizer,
        held_out: HeldOut,
        accuracy: f64,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            target_term: target_term.to_lowercase(),
            model,
            vectorizer,
            held_out,
            accuracy,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        debug!("Saved classifier bundle to {}", path.display());
        Ok(())
    }

    /// Read a bundle, rejecting unknown format versions
    ///
    /// Integrity is not checked here; see [`ClassifierBundle::verify`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TonkbotError::MissingFile(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;

        let probe: VersionProbe = serde_json::from_slice(&bytes)?;
        if probe.format_version != FORMAT_VERSION {
            return Err(TonkbotError::UnsupportedModelVersion {
                found: probe.format_version,
                expected: FORMAT_VERSION,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Recompute held-out accuracy and compare it with the recorded value
    ///
    /// Returns the recomputed accuracy when the bundle is consistent.
    pub fn verify(&self) -> Result<f64> {
        let width = self.vectorizer.vocabulary_len();
        self.model.validate(width)?;
        if self.held_out.features.n_features() != width {
            return Err(TonkbotError::CorruptModel(format!(
                "vocabulary has {width} tokens but held-out rows have {}",
                self.held_out.features.n_features()
            )));
        }
        if self.held_out.features.n_rows() != self.held_out.labels.len() {
            return Err(TonkbotError::CorruptModel(format!(
                "{} held-out rows but {} labels",
                self.held_out.features.n_rows(),
                self.held_out.labels.len()
            )));
        }
        if self
            .held_out
            .features
            .rows()
            .iter()
            .flatten()
            .any(|&(column, _)| column >= width)
        {
            return Err(TonkbotError::CorruptModel(
                "held-out row references a column outside the vocabulary".to_string(),
            ));
        }

        let recomputed = self
            .model
            .score(&self.held_out.features, &self.held_out.labels)?;
        if recomputed.to_bits() == self.accuracy.to_bits() {
            Ok(recomputed)
        } else {
            Err(TonkbotError::ModelIntegrity {
                recorded: self.accuracy,
                recomputed,
            })
        }
    }
}

/// A verified bundle ready to classify live titles
#[derive(Debug)]
pub struct Classifier {
    normalizer: Normalizer,
    vectorizer: FeatureVectorizer,
    model: MultinomialNb,
    accuracy: f64,
}

impl Classifier {
    /// Verify `bundle` and wrap it
    ///
    /// With `strict` an accuracy mismatch is fatal; otherwise it is logged and
    /// predictions proceed. Structural corruption is always fatal.
    pub fn from_bundle(bundle: ClassifierBundle, strict: bool) -> Result<Self> {
        match bundle.verify() {
            Ok(accuracy) => {
                info!(
                    "Loaded classifier (held-out accuracy {:.1}%, {} tokens)",
                    accuracy * 100.0,
                    bundle.vectorizer.vocabulary_len()
                );
            }
            Err(TonkbotError::ModelIntegrity {
                recorded,
                recomputed,
            }) if !strict => {
                warn!(
                    "Saved and test model accuracy do not match (recorded {recorded}, recomputed {recomputed}); continuing"
                );
            }
            Err(e) => return Err(e),
        }

        Ok(Self {
            normalizer: Normalizer::new(&bundle.target_term),
            vectorizer: bundle.vectorizer,
            model: bundle.model,
            accuracy: bundle.accuracy,
        })
    }

    pub fn load(path: &Path, strict: bool) -> Result<Self> {
        Self::from_bundle(ClassifierBundle::load(path)?, strict)
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Classify a raw post title
    pub fn classify(&self, title: &str) -> Result<Prediction> {
        let normalized = self.normalizer.normalize(title);
        let features = self.vectorizer.transform(&[normalized]);
        let prediction = Prediction::from_label(self.model.predict_one(&features)?);
        debug!("Classified {title:?} as {prediction}");
        Ok(prediction)
    }
}
