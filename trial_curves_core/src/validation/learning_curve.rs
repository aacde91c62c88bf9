//! Learning curves: score as a function of training-set size
//!
//! Every (training size, fold) pair is an independent fit on its own clone of
//! the model, so the pairs are dispatched to a bounded rayon pool. Per-size
//! statistics are reduced only after every pair has finished, and always in
//! (size, fold) order, so results do not depend on scheduling.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::split::Fold;
use crate::data::TrialDataset;
use crate::error::{EvalError, EvalResult};
use crate::learner::BinaryClassifier;

/// Arithmetic mean and population standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

impl MeanStd {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.std
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.std
    }
}

/// Aggregated results for one training size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningCurveRow {
    /// Requested fraction of the training pool
    pub fraction: f64,
    /// Absolute number of training samples
    pub train_size: usize,
    pub train_score: MeanStd,
    pub test_score: MeanStd,
    /// Seconds spent in `fit`
    pub fit_time: MeanStd,
    /// Seconds spent scoring the held-out fold
    pub score_time: MeanStd,
    /// Per-fold values, in fold order
    pub fold_train_scores: Vec<f64>,
    pub fold_test_scores: Vec<f64>,
    pub fold_fit_times: Vec<f64>,
}

/// One point of the fit-time vs. score trade-off
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeoffPoint {
    pub fit_time: f64,
    pub score: MeanStd,
}

/// Rows ordered by strictly increasing training size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningCurve {
    pub rows: Vec<LearningCurveRow>,
}

impl LearningCurve {
    pub fn train_sizes(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.train_size).collect()
    }

    /// Mean test score against mean fit time, sorted by ascending fit time
    pub fn fit_time_tradeoff(&self) -> Vec<TradeoffPoint> {
        let mut points: Vec<TradeoffPoint> = self
            .rows
            .iter()
            .map(|row| TradeoffPoint {
                fit_time: row.fit_time.mean,
                score: row.test_score,
            })
            .collect();
        points.sort_by(|a, b| a.fit_time.total_cmp(&b.fit_time));
        points
    }
}

/// Knobs for the learning-curve pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurveSettings {
    /// Strictly increasing fractions in (0, 1]
    pub train_sizes: Vec<f64>,
    /// Worker threads; 0 uses the available hardware concurrency
    pub workers: usize,
    /// Seed for the per-fold training-order shuffle
    pub seed: u64,
}

impl Default for LearningCurveSettings {
    fn default() -> Self {
        Self {
            train_sizes: linspace(0.1, 1.0, 5),
            workers: 0,
            seed: 0,
        }
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i + 1 == count { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Check that fractions are non-empty, in (0, 1] and strictly increasing
pub fn validate_fractions(fractions: &[f64]) -> EvalResult<()> {
    if fractions.is_empty() {
        return Err(EvalError::Config("train_sizes must not be empty".into()));
    }
    if let Some(bad) = fractions
        .iter()
        .find(|&&f| !(f.is_finite() && f > 0.0 && f <= 1.0))
    {
        return Err(EvalError::Config(format!(
            "train size fraction {bad} is outside (0, 1]"
        )));
    }
    if fractions.windows(2).any(|w| w[0] >= w[1]) {
        return Err(EvalError::Config(
            "train_sizes must be strictly increasing".into(),
        ));
    }
    Ok(())
}

/// Map fractions onto absolute sizes of a training pool.
///
/// Sizes are `round(f * pool)` clamped to `[1, pool]`; a size equal to an
/// earlier one is dropped so the result stays strictly increasing.
pub fn absolute_train_sizes(fractions: &[f64], pool: usize) -> Vec<(f64, usize)> {
    let mut sizes: Vec<(f64, usize)> = Vec::with_capacity(fractions.len());
    for &fraction in fractions {
        let size = ((fraction * pool as f64).round() as usize).clamp(1, pool.max(1));
        match sizes.last() {
            Some(&(_, previous)) if previous >= size => {
                tracing::warn!(
                    fraction,
                    size,
                    "train size collapses onto a smaller fraction, dropping it"
                );
            }
            _ => sizes.push((fraction, size)),
        }
    }
    sizes
}

struct FitOutcome {
    train_score: f64,
    test_score: f64,
    fit_time: f64,
    score_time: f64,
}

/// Training indices in the order subsets are drawn from: a seeded shuffle
/// per fold, so smaller subsets are prefixes of larger ones.
fn training_order(fold: &Fold, fold_idx: usize, seed: u64) -> Vec<usize> {
    let mut order = fold.train.clone();
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(fold_idx as u64));
    order.shuffle(&mut rng);
    order
}

pub(crate) fn single_class(labels: &[usize]) -> Option<usize> {
    let first = *labels.first()?;
    labels.iter().all(|&l| l == first).then_some(first)
}

fn fit_and_score<M: BinaryClassifier>(
    model: &M,
    train: &TrialDataset,
    test: &TrialDataset,
    fold: usize,
) -> EvalResult<FitOutcome> {
    if let Some(class) = single_class(&train.labels) {
        return Err(EvalError::DegenerateFold {
            fold,
            reason: format!(
                "training subset of {} samples contains only class {class}",
                train.len()
            ),
        });
    }

    let mut model = model.clone();
    let start = Instant::now();
    model.fit(train.features.view(), &train.labels)?;
    let fit_time = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let test_score = model.score(test.features.view(), &test.labels)?;
    let score_time = start.elapsed().as_secs_f64();

    let train_score = model.score(train.features.view(), &train.labels)?;

    Ok(FitOutcome {
        train_score,
        test_score,
        fit_time,
        score_time,
    })
}

/// Compute the learning curve of `model` over precomputed folds.
///
/// `model` itself is never fitted; each evaluation works on a clone.
pub fn learning_curve<M: BinaryClassifier>(
    model: &M,
    dataset: &TrialDataset,
    folds: &[Fold],
    settings: &LearningCurveSettings,
) -> EvalResult<LearningCurve> {
    validate_fractions(&settings.train_sizes)?;
    let first = folds
        .first()
        .ok_or_else(|| EvalError::InvalidInput("no folds to evaluate".into()))?;
    if let Some(empty) = folds.iter().position(|f| f.train.is_empty() || f.test.is_empty()) {
        return Err(EvalError::InvalidInput(format!(
            "fold {} has an empty train or test side",
            empty + 1
        )));
    }

    let sizes = absolute_train_sizes(&settings.train_sizes, first.train.len());
    let orders: Vec<Vec<usize>> = folds
        .iter()
        .enumerate()
        .map(|(idx, fold)| training_order(fold, idx, settings.seed))
        .collect();
    let tests: Vec<TrialDataset> = folds.iter().map(|f| dataset.select(&f.test)).collect();

    let tasks: Vec<(usize, usize)> = (0..sizes.len())
        .flat_map(|size_idx| (0..folds.len()).map(move |fold_idx| (size_idx, fold_idx)))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers)
        .build()
        .map_err(|err| EvalError::InvalidInput(format!("worker pool: {err}")))?;

    tracing::debug!(
        sizes = sizes.len(),
        folds = folds.len(),
        workers = pool.current_num_threads(),
        "dispatching learning-curve fits"
    );

    let outcomes: Vec<EvalResult<FitOutcome>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|&(size_idx, fold_idx)| {
                let order = &orders[fold_idx];
                let n = sizes[size_idx].1.min(order.len());
                let train = dataset.select(&order[..n]);
                fit_and_score(model, &train, &tests[fold_idx], fold_idx + 1)
            })
            .collect()
    });
    // Join point: every fit has finished before anything is aggregated.
    let outcomes = outcomes.into_iter().collect::<EvalResult<Vec<_>>>()?;

    let rows = sizes
        .iter()
        .zip(outcomes.chunks(folds.len()))
        .map(|(&(fraction, train_size), per_fold)| {
            let pick = |f: fn(&FitOutcome) -> f64| per_fold.iter().map(f).collect::<Vec<f64>>();
            let fold_train_scores = pick(|o| o.train_score);
            let fold_test_scores = pick(|o| o.test_score);
            let fold_fit_times = pick(|o| o.fit_time);
            let score_times = pick(|o| o.score_time);

            let row = LearningCurveRow {
                fraction,
                train_size,
                train_score: aggregate(&fold_train_scores),
                test_score: aggregate(&fold_test_scores),
                fit_time: aggregate(&fold_fit_times),
                score_time: aggregate(&score_times),
                fold_train_scores,
                fold_test_scores,
                fold_fit_times,
            };
            tracing::info!(
                train_size,
                train_score = row.train_score.mean,
                test_score = row.test_score.mean,
                fit_time = row.fit_time.mean,
                "learning-curve row"
            );
            row
        })
        .collect();

    Ok(LearningCurve { rows })
}

fn aggregate(values: &[f64]) -> MeanStd {
    MeanStd::from_values(values).unwrap_or(MeanStd { mean: 0.0, std: 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticConfig;
    use crate::learner::LogisticRegression;
    use crate::validation::split::{CrossValidator, GroupKFold};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_std_is_population() {
        let stats = MeanStd::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_abs_diff_eq!(stats.mean, 2.5);
        assert_abs_diff_eq!(stats.std, 1.25f64.sqrt());
        assert_abs_diff_eq!(stats.lower(), 2.5 - 1.25f64.sqrt());
        assert!(MeanStd::from_values(&[]).is_none());
    }

    #[test]
    fn test_linspace_matches_default_fractions() {
        let values = linspace(0.1, 1.0, 5);
        let expected = [0.1, 0.325, 0.55, 0.775, 1.0];
        for (v, e) in values.iter().zip(expected) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-12);
        }
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
    }

    #[test]
    fn test_validate_fractions() {
        assert!(validate_fractions(&[0.1, 0.5, 1.0]).is_ok());
        assert!(validate_fractions(&[]).is_err());
        assert!(validate_fractions(&[0.0, 0.5]).is_err());
        assert!(validate_fractions(&[0.5, 1.2]).is_err());
        assert!(validate_fractions(&[0.5, 0.5]).is_err());
        assert!(validate_fractions(&[0.7, 0.3]).is_err());
    }

    #[test]
    fn test_absolute_sizes_round_and_dedupe() {
        let sizes = absolute_train_sizes(&linspace(0.1, 1.0, 5), 80);
        let absolute: Vec<usize> = sizes.iter().map(|&(_, s)| s).collect();
        assert_eq!(absolute, vec![8, 26, 44, 62, 80]);

        let sizes = absolute_train_sizes(&[0.01, 0.02, 0.5], 10);
        let absolute: Vec<usize> = sizes.iter().map(|&(_, s)| s).collect();
        assert_eq!(absolute, vec![1, 5]);
    }

    #[test]
    fn test_tradeoff_sorted_by_fit_time() {
        let row = |size: usize, fit: f64, score: f64| LearningCurveRow {
            fraction: 0.5,
            train_size: size,
            train_score: MeanStd { mean: 1.0, std: 0.0 },
            test_score: MeanStd { mean: score, std: 0.1 },
            fit_time: MeanStd { mean: fit, std: 0.0 },
            score_time: MeanStd { mean: 0.0, std: 0.0 },
            fold_train_scores: vec![],
            fold_test_scores: vec![],
            fold_fit_times: vec![],
        };
        let curve = LearningCurve {
            rows: vec![row(10, 0.3, 0.6), row(20, 0.1, 0.7), row(30, 0.2, 0.8)],
        };
        let points = curve.fit_time_tradeoff();
        let times: Vec<f64> = points.iter().map(|p| p.fit_time).collect();
        assert_eq!(times, vec![0.1, 0.2, 0.3]);
        assert_abs_diff_eq!(points[0].score.mean, 0.7);
    }

    #[test]
    fn test_learning_curve_shape() {
        let dataset = TrialDataset::synthetic(&SyntheticConfig::default());
        let folds = GroupKFold::new(5).split(&dataset).unwrap();
        let model = LogisticRegression::default();
        let settings = LearningCurveSettings {
            workers: 2,
            ..Default::default()
        };

        let curve = learning_curve(&model, &dataset, &folds, &settings).unwrap();

        assert_eq!(curve.rows.len(), 5);
        assert!(curve.train_sizes().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(curve.rows[4].train_size, folds[0].train.len());
        for row in &curve.rows {
            assert_eq!(row.fold_test_scores.len(), 5);
            assert!((0.0..=1.0).contains(&row.test_score.mean));
            assert!(row.fit_time.mean >= 0.0);
        }
        // The caller's instance is never fitted.
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_single_class_subset_is_degenerate() {
        let mut dataset = TrialDataset::synthetic(&SyntheticConfig {
            n_groups: 4,
            trials_per_group: 4,
            ..Default::default()
        });
        dataset.labels.iter_mut().for_each(|l| *l = 0);
        dataset.labels[0] = 1;
        let folds = GroupKFold::new(2).split(&dataset).unwrap();

        let err = learning_curve(
            &LogisticRegression::default(),
            &dataset,
            &folds,
            &LearningCurveSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::DegenerateFold { .. }));
    }
}
