//! Curve evaluator: learning curve plus per-fold ROC for one dataset

use serde::{Deserialize, Serialize};

use super::learning_curve::{learning_curve, single_class, LearningCurve, LearningCurveSettings};
use super::roc::{roc_curve, FoldRoc, RocSummary};
use super::split::{CrossValidator, Fold, KFold};
use crate::data::TrialDataset;
use crate::error::{EvalError, EvalResult};
use crate::learner::BinaryClassifier;

/// Which folds the ROC pass uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RocSplit {
    /// Same folds as the learning-curve pass
    #[default]
    #[serde(rename = "same")]
    Same,
    /// Unshuffled plain K-fold with the same K, ignoring groups
    #[serde(rename = "kfold")]
    KFold,
}

/// Evaluator settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub learning_curve: LearningCurveSettings,
    pub roc_split: RocSplit,
}

/// Everything computed for one dataset variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub learning_curve: LearningCurve,
    pub roc: Vec<FoldRoc>,
    pub roc_summary: Option<RocSummary>,
    /// Size of the first fold's training pool (the 100% training size)
    pub train_pool: usize,
}

/// Runs the learning-curve pass followed by the ROC pass
#[derive(Debug, Clone, Default)]
pub struct CurveEvaluator {
    config: EvaluatorConfig,
}

impl CurveEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate `model` on `dataset` with the folds produced by `cv`.
    ///
    /// The learning-curve pass fits clones and leaves `model` untouched. The
    /// ROC pass then fits `model` itself once per fold, so on return it holds
    /// the parameters of the last ROC fold and nothing else.
    pub fn evaluate<M, C>(&self, model: &mut M, dataset: &TrialDataset, cv: &C) -> EvalResult<Evaluation>
    where
        M: BinaryClassifier,
        C: CrossValidator + ?Sized,
    {
        check_dataset(dataset)?;
        let folds = cv.split(dataset)?;
        if folds.len() != cv.n_splits() {
            return Err(EvalError::InvalidInput(format!(
                "splitter produced {} folds, expected {}",
                folds.len(),
                cv.n_splits()
            )));
        }

        let curve = learning_curve(&*model, dataset, &folds, &self.config.learning_curve)?;

        let roc_folds = match self.config.roc_split {
            RocSplit::Same => folds.clone(),
            RocSplit::KFold => KFold::new(cv.n_splits()).split(dataset)?,
        };
        let roc = fold_rocs(model, dataset, &roc_folds)?;
        let roc_summary = RocSummary::from_folds(&roc);
        if let Some(summary) = roc_summary {
            tracing::info!(
                mean_auc = summary.mean_auc,
                std_auc = summary.std_auc,
                folds = roc.len(),
                "ROC pass complete"
            );
        }

        Ok(Evaluation {
            learning_curve: curve,
            roc,
            roc_summary,
            train_pool: folds[0].train.len(),
        })
    }
}

fn check_dataset(dataset: &TrialDataset) -> EvalResult<()> {
    if dataset.is_empty() {
        return Err(EvalError::InvalidInput("dataset is empty".into()));
    }
    if let Some(&bad) = dataset.labels.iter().find(|&&l| l > 1) {
        return Err(EvalError::InvalidInput(format!(
            "label {bad} is not a binary class"
        )));
    }
    Ok(())
}

/// Fit `model` on each fold in turn and build the ROC curve of its
/// positive-class probabilities on the held-out side.
///
/// Every fit overwrites the previous one. Folds are numbered from 1 in the
/// order given.
pub fn fold_rocs<M: BinaryClassifier>(
    model: &mut M,
    dataset: &TrialDataset,
    folds: &[Fold],
) -> EvalResult<Vec<FoldRoc>> {
    folds
        .iter()
        .enumerate()
        .map(|(idx, fold)| {
            let number = idx + 1;
            let train = dataset.select(&fold.train);
            let test = dataset.select(&fold.test);

            if let Some(class) = single_class(&train.labels) {
                return Err(EvalError::DegenerateFold {
                    fold: number,
                    reason: format!("training split contains only class {class}"),
                });
            }
            if let Some(class) = single_class(&test.labels) {
                return Err(EvalError::DegenerateFold {
                    fold: number,
                    reason: format!("test split contains only class {class}, ROC is undefined"),
                });
            }

            model.fit(train.features.view(), &train.labels)?;
            let probabilities = model.predict_proba(test.features.view())?;
            let scores = probabilities.to_vec();
            let curve = roc_curve(&scores, &test.labels).map_err(|err| EvalError::DegenerateFold {
                fold: number,
                reason: err.to_string(),
            })?;

            tracing::debug!(fold = number, auc = curve.auc, "fold ROC");
            Ok(FoldRoc {
                fold: number,
                curve,
            })
        })
        .collect()
}
