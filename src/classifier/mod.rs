//! Title classification: normalization, bag-of-words features, Naive Bayes
//!
//! Training happens offline in [`trainer`]; the bot only ever loads a
//! [`ClassifierBundle`] and classifies through [`Classifier`].

pub mod bundle;
pub mod dataset;
pub mod naive_bayes;
pub mod normalize;
pub mod trainer;
pub mod vectorizer;

pub use bundle::Classifier;
pub use bundle::ClassifierBundle;
pub use bundle::HeldOut;
pub use bundle::FORMAT_VERSION;
pub use dataset::LabeledExample;
pub use naive_bayes::MultinomialNb;
pub use normalize::Normalizer;
pub use trainer::TrainingOptions;
pub use trainer::TrainingOutcome;
pub use vectorizer::FeatureMatrix;
pub use vectorizer::FeatureVectorizer;
