//! # Trial Curves Core
//!
//! Evaluates a binary classifier on per-trial feature tables and reports how
//! it behaves as the training set grows. Trials from the same session or
//! subject share a group id, and the default splitter keeps every group on
//! one side of each fold.
//!
//! For each dataset variant a run produces:
//! - a learning curve (train and cross-validation accuracy, mean ± std over
//!   folds, against training-set size)
//! - one ROC curve per fold with its AUC
//! - a fit-time vs. score tradeoff curve
//!
//! and draws them into a single 3 × N figure, one column per variant.
//!
//! ## Quick Start
//!
//! ```rust
//! use trial_curves_core::{
//!     CurveEvaluator, GroupKFold, LogisticRegression, SyntheticConfig, TrialDataset,
//! };
//!
//! let dataset = TrialDataset::synthetic(&SyntheticConfig::default());
//! let mut model = LogisticRegression::default();
//! let evaluation = CurveEvaluator::default()
//!     .evaluate(&mut model, &dataset, &GroupKFold::new(5))
//!     .unwrap();
//!
//! assert_eq!(evaluation.learning_curve.rows.len(), 5);
//! assert_eq!(evaluation.roc.len(), 5);
//! ```
//!
//! ## Core Modules
//!
//! - [`config`] - Report configuration via TOML
//! - [`data`] - CSV trial loading
//! - [`learner`] - Regularised logistic regression
//! - [`validation`] - Splitters, learning curve, ROC/AUC
//! - [`report`] - Figure rendering with plotters
//! - [`logging`] - Tracing setup and JSON line-delimited run log
//! - [`pipeline`] - End-to-end run over every variant

pub mod config;
pub mod data;
pub mod error;
pub mod learner;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod validation;

pub use config::{CrossValidationConfig, RenderConfig, ReportConfig, VariantConfig};
pub use data::{SyntheticConfig, Trial, TrialDataset, TrialSchema};
pub use error::{EvalError, EvalResult};
pub use learner::{BinaryClassifier, ClassifierConfig, LogisticRegression};
pub use logging::{init_tracing, RunLog};
pub use pipeline::{run, ReportSummary, VariantSummary};
pub use report::{render_report, VariantReport};
pub use validation::{
    learning_curve, roc_curve, CrossValidator, CurveEvaluator, Evaluation, EvaluatorConfig,
    Fold, FoldRoc, GroupKFold, KFold, LearningCurve, LearningCurveRow, LearningCurveSettings,
    MeanStd, RocCurve, RocSplit, SplitStrategy, Splitter,
};
