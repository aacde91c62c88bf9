//! Plot-ready series derived from an [`Evaluation`].
//!
//! Everything here is pure data preparation so the figure code only has to
//! hand points to plotters.

use crate::validation::{Evaluation, MeanStd, TradeoffPoint};

/// One dataset variant's results, ready to be drawn in a figure column
#[derive(Debug, Clone)]
pub struct VariantReport {
    pub name: String,
    pub evaluation: Evaluation,
}

/// A mean line with its mean±std band
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub label: &'static str,
    pub mean: Vec<(f64, f64)>,
    /// Closed outline: upper edge left to right, then lower edge right to left
    pub band: Vec<(f64, f64)>,
}

impl BandSeries {
    pub fn new(label: &'static str, points: &[(f64, MeanStd)]) -> Self {
        let mean = points.iter().map(|&(x, s)| (x, s.mean)).collect();
        let band = points
            .iter()
            .map(|&(x, s)| (x, s.upper()))
            .chain(points.iter().rev().map(|&(x, s)| (x, s.lower())))
            .collect();
        Self { label, mean, band }
    }

    /// Smallest and largest y reached by the band
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        extent(self.band.iter().map(|&(_, y)| y))
    }
}

/// Row 1: train and cross-validation score against training-set size
#[derive(Debug, Clone, PartialEq)]
pub struct LearningCurvePanel {
    pub title: String,
    pub train: BandSeries,
    pub test: BandSeries,
    pub x_range: (f64, f64),
}

/// Row 2: one ROC line per fold
#[derive(Debug, Clone, PartialEq)]
pub struct RocPanel {
    pub lines: Vec<(String, Vec<(f64, f64)>)>,
}

/// Row 3: mean test score against mean fit time
#[derive(Debug, Clone, PartialEq)]
pub struct TradeoffPanel {
    pub score: BandSeries,
    pub x_range: (f64, f64),
}

impl LearningCurvePanel {
    pub fn from_evaluation(title: &str, evaluation: &Evaluation) -> Self {
        let rows = &evaluation.learning_curve.rows;
        let train: Vec<(f64, MeanStd)> = rows
            .iter()
            .map(|row| (row.train_size as f64, row.train_score))
            .collect();
        let test: Vec<(f64, MeanStd)> = rows
            .iter()
            .map(|row| (row.train_size as f64, row.test_score))
            .collect();
        let x_range = padded_range(extent(train.iter().map(|&(x, _)| x)));

        Self {
            title: title.to_string(),
            train: BandSeries::new("Training score", &train),
            test: BandSeries::new("Cross-validation score", &test),
            x_range,
        }
    }

    /// Score axis: the unit interval, widened if a band leaves it
    pub fn y_range(&self) -> (f64, f64) {
        score_range([self.train.y_extent(), self.test.y_extent()])
    }
}

impl RocPanel {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let lines = evaluation
            .roc
            .iter()
            .map(|fold| {
                let points = fold
                    .curve
                    .fpr
                    .iter()
                    .copied()
                    .zip(fold.curve.tpr.iter().copied())
                    .collect();
                (fold.label(), points)
            })
            .collect();
        Self { lines }
    }
}

impl TradeoffPanel {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let points: Vec<(f64, MeanStd)> = evaluation
            .learning_curve
            .fit_time_tradeoff()
            .into_iter()
            .map(|TradeoffPoint { fit_time, score }| (fit_time, score))
            .collect();
        let x_range = padded_range(extent(points.iter().map(|&(x, _)| x)));
        Self {
            score: BandSeries::new("Cross-validation score", &points),
            x_range,
        }
    }

    pub fn y_range(&self) -> (f64, f64) {
        score_range([self.score.y_extent(), None])
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Range with a 5% margin; degenerate or missing extents become non-empty
fn padded_range(extent: Option<(f64, f64)>) -> (f64, f64) {
    match extent {
        None => (0.0, 1.0),
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => {
            let pad = if lo.abs() > f64::EPSILON { lo.abs() * 0.1 } else { 1.0 };
            (lo - pad, hi + pad)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

fn score_range(extents: [Option<(f64, f64)>; 2]) -> (f64, f64) {
    extents
        .into_iter()
        .flatten()
        .fold((0.0, 1.05), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{
        roc_curve, FoldRoc, LearningCurve, LearningCurveRow, MeanStd,
    };

    fn stats(mean: f64, std: f64) -> MeanStd {
        MeanStd { mean, std }
    }

    fn evaluation() -> Evaluation {
        let row = |size: usize, fit: f64, test: f64| LearningCurveRow {
            fraction: 0.0,
            train_size: size,
            train_score: stats(0.9, 0.05),
            test_score: stats(test, 0.1),
            fit_time: stats(fit, 0.0),
            score_time: stats(0.0, 0.0),
            fold_train_scores: vec![],
            fold_test_scores: vec![],
            fold_fit_times: vec![],
        };
        Evaluation {
            learning_curve: LearningCurve {
                rows: vec![row(10, 0.02, 0.6), row(20, 0.01, 0.7), row(40, 0.03, 0.8)],
            },
            roc: vec![FoldRoc {
                fold: 1,
                curve: roc_curve(&[0.9, 0.2, 0.6], &[1, 0, 0]).unwrap(),
            }],
            roc_summary: None,
            train_pool: 40,
        }
    }

    #[test]
    fn test_band_outline() {
        let series = BandSeries::new("x", &[(1.0, stats(0.5, 0.1)), (2.0, stats(0.7, 0.2))]);
        assert_eq!(series.mean, vec![(1.0, 0.5), (2.0, 0.7)]);
        let expected = [(1.0, 0.6), (2.0, 0.9), (2.0, 0.5), (1.0, 0.4)];
        for (got, want) in series.band.iter().zip(expected) {
            assert!((got.0 - want.0).abs() < 1e-12 && (got.1 - want.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_learning_curve_panel() {
        let panel = LearningCurvePanel::from_evaluation("Raw audio", &evaluation());
        assert_eq!(panel.title, "Raw audio");
        assert_eq!(panel.train.label, "Training score");
        assert_eq!(panel.test.label, "Cross-validation score");
        let xs: Vec<f64> = panel.test.mean.iter().map(|&(x, _)| x).collect();
        assert_eq!(xs, vec![10.0, 20.0, 40.0]);
        assert!(panel.x_range.0 < 10.0 && panel.x_range.1 > 40.0);
        let (lo, hi) = panel.y_range();
        assert!(lo <= 0.0 && hi >= 1.0);
    }

    #[test]
    fn test_roc_panel_labels() {
        let panel = RocPanel::from_evaluation(&evaluation());
        assert_eq!(panel.lines.len(), 1);
        assert_eq!(panel.lines[0].0, "ROC fold 1 (AUC = 1.00)");
        assert_eq!(panel.lines[0].1.first(), Some(&(0.0, 0.0)));
        assert_eq!(panel.lines[0].1.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn test_tradeoff_panel_sorted() {
        let panel = TradeoffPanel::from_evaluation(&evaluation());
        let xs: Vec<f64> = panel.score.mean.iter().map(|&(x, _)| x).collect();
        assert_eq!(xs, vec![0.01, 0.02, 0.03]);
        let ys: Vec<f64> = panel.score.mean.iter().map(|&(_, y)| y).collect();
        assert_eq!(ys, vec![0.7, 0.6, 0.8]);
    }

    #[test]
    fn test_padded_range_never_empty() {
        assert_eq!(padded_range(None), (0.0, 1.0));
        let (lo, hi) = padded_range(Some((0.0, 0.0)));
        assert!(lo < hi);
        let (lo, hi) = padded_range(Some((2.0, 2.0)));
        assert!(lo < 2.0 && hi > 2.0);
    }
}
