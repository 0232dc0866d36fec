//! Multinomial Naive Bayes over word counts
//!
//! A thin wrapper around smartcore's `MultinomialNB` that speaks
//! `FeatureMatrix` and boolean labels. Class `0` is the negative class.

use serde::de::Error as _;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::naive_bayes::multinomial::MultinomialNB;
use smartcore::naive_bayes::multinomial::MultinomialNBParameters;

use super::vectorizer::FeatureMatrix;
use crate::errors::TonkbotError;
use crate::Result;

/// Additive (Laplace) smoothing constant
pub const DEFAULT_ALPHA: f64 = 1.0;

type TitleNb = MultinomialNB<u32, u8, DenseMatrix<u32>, Vec<u8>>;

#[derive(Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MultinomialNb {
    inner: TitleNb,
}

// smartcore stores its fitted state as an `Option`; an unfitted model
// panics in every accessor, so refuse to load one.
impl<'de> Deserialize<'de> for MultinomialNb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("inner").map_or(true, serde_json::Value::is_null) {
            return Err(D::Error::custom("model has not been fitted"));
        }
        let inner = serde_json::from_value(value).map_err(D::Error::custom)?;
        Ok(Self { inner })
    }
}

/// Row-major dense copy of a sparse count matrix
fn to_dense(features: &FeatureMatrix) -> Result<DenseMatrix<u32>> {
    let width = features.n_features();
    let mut values = vec![0u32; features.n_rows() * width];
    for (index, row) in features.rows().iter().enumerate() {
        for &(column, count) in row {
            if column >= width {
                return Err(TonkbotError::Dataset(format!(
                    "column {column} outside a matrix of width {width}"
                )));
            }
            values[index * width + column] = count;
        }
    }
    Ok(DenseMatrix::new(features.n_rows(), width, values, false)?)
}

impl MultinomialNb {
    pub fn fit(features: &FeatureMatrix, labels: &[bool]) -> Result<Self> {
        if features.n_rows() != labels.len() {
            return Err(TonkbotError::Dataset(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(TonkbotError::Dataset(
                "cannot fit a model on an empty training set".to_string(),
            ));
        }

        let x = to_dense(features)?;
        let y: Vec<u8> = labels.iter().map(|&label| u8::from(label)).collect();
        let parameters = MultinomialNBParameters::default().with_alpha(DEFAULT_ALPHA);
        let inner = MultinomialNB::fit(&x, &y, parameters)?;
        Ok(Self { inner })
    }

    pub fn n_features(&self) -> usize {
        self.inner.n_features()
    }

    /// Check that the fitted parameters describe a binary model over
    /// `width` columns
    pub fn validate(&self, width: usize) -> Result<()> {
        let classes = self.inner.classes();
        if classes.is_empty() || classes.iter().any(|&class| class > 1) {
            return Err(TonkbotError::CorruptModel(format!(
                "unexpected classes {classes:?}"
            )));
        }
        if self.inner.class_count().len() != classes.len()
            || self.inner.feature_log_prob().len() != classes.len()
            || self.inner.feature_count().len() != classes.len()
        {
            return Err(TonkbotError::CorruptModel(
                "per-class parameters do not match the class list".to_string(),
            ));
        }
        if self.inner.n_features() != width {
            return Err(TonkbotError::CorruptModel(format!(
                "model has {} features, vocabulary has {width}",
                self.inner.n_features()
            )));
        }
        let rows_ok = self
            .inner
            .feature_log_prob()
            .iter()
            .all(|row| row.len() == width)
            && self.inner.feature_count().iter().all(|row| row.len() == width);
        if !rows_ok {
            return Err(TonkbotError::CorruptModel(format!(
                "per-class feature rows are not {width} wide"
            )));
        }
        Ok(())
    }

    /// Most probable class for every row; ties go to the negative class
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<bool>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let predicted = self.inner.predict(&to_dense(features)?)?;
        Ok(predicted.into_iter().map(|class| class == 1).collect())
    }

    /// Prediction for the first row; no row at all counts as negative
    pub fn predict_one(&self, features: &FeatureMatrix) -> Result<bool> {
        Ok(self.predict(features)?.into_iter().next().unwrap_or(false))
    }

    /// Fraction of rows predicted correctly, 0.0 for an empty set
    pub fn score(&self, features: &FeatureMatrix, labels: &[bool]) -> Result<f64> {
        if labels.is_empty() {
            return Ok(0.0);
        }
        let correct = self
            .predict(features)?
            .iter()
            .zip(labels)
            .filter(|(predicted, actual)| predicted == actual)
            .count();
        Ok(correct as f64 / labels.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::vectorizer::FeatureVectorizer;

    #[test]
    fn test_predicts_dominant_words() {
        let corpus = ["ramen noodle ramen", "ramen egg", "cutlet sandwich", "cutlet curry"];
        let labels = [true, true, false, false];
        let (features, vectorizer) = FeatureVectorizer::fit(&corpus);
        let model = MultinomialNb::fit(&features, &labels).unwrap();

        assert_eq!(
            model.predict(&vectorizer.transform(&["ramen", "cutlet"])).unwrap(),
            vec![true, false]
        );
        assert!((model.score(&features, &labels).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prior_decides_empty_row() {
        let (features, vectorizer) = FeatureVectorizer::fit(&["ramen", "broth", "bowl"]);
        let model = MultinomialNb::fit(&features, &[false, false, true]).unwrap();

        assert!(!model.predict_one(&vectorizer.transform(&[""])).unwrap());
    }

    #[test]
    fn test_hand_computed_likelihoods() {
        // class 1: "ramen" once; class 0: "great tonkotsu broth"
        let (features, vectorizer) = FeatureVectorizer::fit(&["ramen", "great tonkotsu broth"]);
        let model = MultinomialNb::fit(&features, &[true, false]).unwrap();
        let log_prob = model.inner.feature_log_prob();

        let ramen = vectorizer.column("ramen").unwrap();
        assert!((log_prob[1][ramen] - (2.0f64 / 5.0).ln()).abs() < 1e-12);
        assert!((log_prob[0][ramen] - (1.0f64 / 7.0).ln()).abs() < 1e-12);
        assert_eq!(model.inner.class_count(), &vec![1, 1]);
    }

    #[test]
    fn test_single_class_training() {
        let (features, vectorizer) = FeatureVectorizer::fit(&["ramen", "broth"]);
        let model = MultinomialNb::fit(&features, &[true, true]).unwrap();

        assert_eq!(
            model.predict(&vectorizer.transform(&["ramen", "", "pizza"])).unwrap(),
            vec![true; 3]
        );
        assert!(model.validate(2).is_ok());
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (features, _) = FeatureVectorizer::fit(&["ramen"]);
        assert!(MultinomialNb::fit(&features, &[true, false]).is_err());
        assert!(MultinomialNb::fit(&FeatureMatrix::default(), &[]).is_err());
    }

    #[test]
    fn test_score_and_predict_empty_set() {
        let (features, _) = FeatureVectorizer::fit(&["ramen"]);
        let model = MultinomialNb::fit(&features, &[true]).unwrap();

        assert!(model.score(&FeatureMatrix::default(), &[]).unwrap().abs() < f64::EPSILON);
        assert!(model.predict(&FeatureMatrix::new(1, Vec::new())).unwrap().is_empty());
        assert!(!model.predict_one(&FeatureMatrix::new(1, Vec::new())).unwrap());
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let corpus = ["ramen noodle", "cutlet sandwich", "ramen broth", "pork cutlet"];
        let labels = [true, false, true, false];
        let (features, _) = FeatureVectorizer::fit(&corpus);
        let model = MultinomialNb::fit(&features, &labels).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: MultinomialNb = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, model);
        assert_eq!(restored.predict(&features).unwrap(), model.predict(&features).unwrap());
    }

    #[test]
    fn test_unfitted_model_is_refused() {
        assert!(serde_json::from_str::<MultinomialNb>(r#"{"inner":null}"#).is_err());
        assert!(serde_json::from_str::<MultinomialNb>("{}").is_err());
    }

    #[test]
    fn test_truncated_feature_rows_fail_validation() {
        let (features, _) = FeatureVectorizer::fit(&["great broth", "ramen bowl"]);
        let model = MultinomialNb::fit(&features, &[false, true]).unwrap();
        assert!(model.validate(4).is_ok());
        assert!(matches!(model.validate(3), Err(TonkbotError::CorruptModel(_))));

        let mut value = serde_json::to_value(&model).unwrap();
        let distribution = &mut value["inner"]["distribution"];
        distribution["feature_log_prob"][1] = serde_json::json!([-1.0]);
        distribution["feature_count"][1] = serde_json::json!([0]);
        let truncated: MultinomialNb = serde_json::from_value(value).unwrap();

        assert!(matches!(truncated.validate(4), Err(TonkbotError::CorruptModel(_))));
    }
}
