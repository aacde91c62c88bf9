//! Cross-validated evaluation of a binary classifier.
//!
//! - [`split`] - K-fold and group K-fold splitters
//! - [`learning_curve`] - score vs. training-set size, fitted in parallel
//! - [`roc`] - ROC curves and trapezoidal AUC
//! - [`evaluator`] - runs both passes for one dataset

pub mod evaluator;
pub mod learning_curve;
pub mod roc;
pub mod split;

pub use evaluator::{fold_rocs, CurveEvaluator, Evaluation, EvaluatorConfig, RocSplit};
pub use learning_curve::{
    absolute_train_sizes, learning_curve, linspace, validate_fractions, LearningCurve,
    LearningCurveRow, LearningCurveSettings, MeanStd, TradeoffPoint,
};
pub use roc::{roc_curve, trapezoidal_auc, FoldRoc, RocCurve, RocSummary};
pub use split::{CrossValidator, Fold, GroupKFold, KFold, SplitStrategy, Splitter};
