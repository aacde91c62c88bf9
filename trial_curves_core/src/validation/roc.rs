//! ROC curves and area under the curve

use serde::Serialize;

use crate::error::{EvalError, EvalResult};

/// ROC curve points ordered by decreasing threshold.
///
/// The first point is always `(0, 0)` at threshold `+inf` and the last is
/// `(1, 1)` at the lowest observed score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
    /// Trapezoidal area under (fpr, tpr)
    pub auc: f64,
}

/// ROC result for one cross-validation fold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldRoc {
    /// 1-based fold number in splitter order
    pub fold: usize,
    pub curve: RocCurve,
}

impl FoldRoc {
    /// Legend text, e.g. `ROC fold 1 (AUC = 0.87)`
    pub fn label(&self) -> String {
        format!("ROC fold {} (AUC = {:.2})", self.fold, self.curve.auc)
    }
}

/// Mean and population standard deviation of per-fold AUCs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocSummary {
    pub mean_auc: f64,
    pub std_auc: f64,
}

impl RocSummary {
    pub fn from_folds(folds: &[FoldRoc]) -> Option<Self> {
        let aucs: Vec<f64> = folds.iter().map(|f| f.curve.auc).collect();
        let stats = super::learning_curve::MeanStd::from_values(&aucs)?;
        Some(Self {
            mean_auc: stats.mean,
            std_auc: stats.std,
        })
    }
}

/// Build the ROC curve for positive-class `scores` against binary `labels`.
///
/// Samples sharing a score enter the curve together, so ties produce a single
/// diagonal step. Fails when either class is absent because one of the rates
/// would be undefined.
pub fn roc_curve(scores: &[f64], labels: &[usize]) -> EvalResult<RocCurve> {
    if scores.is_empty() {
        return Err(EvalError::InvalidInput("ROC curve of empty input".into()));
    }
    if scores.len() != labels.len() {
        return Err(EvalError::InvalidInput(format!(
            "{} scores but {} labels",
            scores.len(),
            labels.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(EvalError::InvalidInput("non-finite score".into()));
    }

    let total_pos = labels.iter().filter(|&&l| l == 1).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 {
        return Err(EvalError::InvalidInput("no positive samples".into()));
    }
    if total_neg == 0 {
        return Err(EvalError::InvalidInput("no negative samples".into()));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let p = total_pos as f64;
    let n = total_neg as f64;
    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if labels[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        fpr.push(fp as f64 / n);
        tpr.push(tp as f64 / p);
        thresholds.push(threshold);
    }

    let auc = trapezoidal_auc(&fpr, &tpr);
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
        auc,
    })
}

/// Area under a piecewise-linear curve given by monotone `x`
pub fn trapezoidal_auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]).abs() * (ys[1] + ys[0]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_perfect_separation() {
        let curve = roc_curve(&[0.9, 0.8, 0.3, 0.1], &[1, 1, 0, 0]).unwrap();
        assert_abs_diff_eq!(curve.auc, 1.0);
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.0, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 1.0, 1.0, 1.0]);
        assert!(curve.thresholds[0].is_infinite());
    }

    #[test]
    fn test_inverted_scores() {
        let curve = roc_curve(&[0.1, 0.2, 0.8, 0.9], &[1, 1, 0, 0]).unwrap();
        assert_abs_diff_eq!(curve.auc, 0.0);
    }

    #[test]
    fn test_known_auc() {
        // Classic example: AUC = 0.75
        let curve = roc_curve(&[0.1, 0.4, 0.35, 0.8], &[0, 0, 1, 1]).unwrap();
        assert_abs_diff_eq!(curve.auc, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_ties_form_one_step() {
        let curve = roc_curve(&[0.5, 0.5, 0.5, 0.5], &[1, 0, 1, 0]).unwrap();
        assert_eq!(curve.fpr, vec![0.0, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 1.0]);
        assert_abs_diff_eq!(curve.auc, 0.5);
    }

    #[test]
    fn test_thresholds_decrease() {
        let curve = roc_curve(&[0.2, 0.7, 0.4, 0.9, 0.1], &[0, 1, 0, 1, 1]).unwrap();
        assert!(curve.thresholds.windows(2).all(|w| w[0] > w[1]));
        assert!(curve.fpr.windows(2).all(|w| w[0] <= w[1]));
        assert!(curve.tpr.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*curve.fpr.last().unwrap(), 1.0);
        assert_eq!(*curve.tpr.last().unwrap(), 1.0);
    }

    #[test]
    fn test_single_class_rejected() {
        assert!(roc_curve(&[0.2, 0.3], &[1, 1]).is_err());
        assert!(roc_curve(&[0.2, 0.3], &[0, 0]).is_err());
        assert!(roc_curve(&[], &[]).is_err());
        assert!(roc_curve(&[0.2], &[0, 1]).is_err());
    }

    #[test]
    fn test_fold_label_format() {
        let fold = FoldRoc {
            fold: 3,
            curve: roc_curve(&[0.1, 0.4, 0.35, 0.8], &[0, 0, 1, 1]).unwrap(),
        };
        assert_eq!(fold.label(), "ROC fold 3 (AUC = 0.75)");
    }

    #[test]
    fn test_summary() {
        let make = |fold, auc| FoldRoc {
            fold,
            curve: RocCurve {
                fpr: vec![],
                tpr: vec![],
                thresholds: vec![],
                auc,
            },
        };
        let summary = RocSummary::from_folds(&[make(1, 0.6), make(2, 0.8)]).unwrap();
        assert_abs_diff_eq!(summary.mean_auc, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.std_auc, 0.1, epsilon = 1e-12);
        assert!(RocSummary::from_folds(&[]).is_none());
    }
}
