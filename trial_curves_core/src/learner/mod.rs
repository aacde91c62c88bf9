//! Learner module - the classifier evaluated by the report
//!
//! [`BinaryClassifier`] is the seam between the evaluator and the model: the
//! evaluator only fits, predicts probabilities and scores accuracy, so any
//! binary model implementing the trait can be dropped in.

pub mod classifier;

pub use classifier::{BinaryClassifier, ClassifierConfig, LogisticParams, LogisticRegression};
