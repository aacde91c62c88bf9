//! Binary classification model
//!
//! L2-regularised logistic regression trained by full-batch gradient descent
//! with a backtracking step size. Features are standardised internally with
//! statistics taken from the training data of the most recent fit.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// Hyperparameters for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Inverse regularisation strength (smaller = stronger penalty)
    pub c: f64,
    /// Iteration cap for gradient descent
    pub max_iter: usize,
    /// Initial step size tried on every iteration
    pub learning_rate: f64,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
    /// Random seed for weight initialization
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            learning_rate: 0.5,
            tolerance: 1e-6,
            seed: 0,
        }
    }
}

/// A fittable binary classifier.
///
/// `fit` always replaces every learned parameter, so an instance reflects only
/// its most recent fit. Callers that need results from several fits at once
/// must clone the model (hence the `Clone` bound) instead of sharing one
/// instance.
pub trait BinaryClassifier: Clone + Send + Sync {
    /// Fit on `features` with labels in `{0, 1}`
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[usize]) -> EvalResult<()>;

    /// Positive-class probability for each row
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> EvalResult<Array1<f64>>;

    /// Whether `fit` has completed at least once
    fn is_fitted(&self) -> bool;

    /// Hard predictions at the 0.5 probability threshold
    fn predict(&self, features: ArrayView2<'_, f64>) -> EvalResult<Vec<usize>> {
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|&p| usize::from(p >= 0.5))
            .collect())
    }

    /// Accuracy on the given rows
    fn score(&self, features: ArrayView2<'_, f64>, labels: &[usize]) -> EvalResult<f64> {
        if labels.is_empty() {
            return Err(EvalError::InvalidInput("cannot score an empty set".into()));
        }
        let predicted = self.predict(features)?;
        let correct = predicted
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        Ok(correct as f64 / labels.len() as f64)
    }
}

/// Parameters learned by one fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Weights in standardised feature space
    pub weights: Array1<f64>,
    pub intercept: f64,
    /// Per-feature mean of the training data
    pub mean: Array1<f64>,
    /// Per-feature scale of the training data (1.0 for constant features)
    pub scale: Array1<f64>,
    /// Gradient-descent iterations actually run
    pub n_iter: usize,
}

/// Binary logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: ClassifierConfig,
    params: Option<LogisticParams>,
}

impl LogisticRegression {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            params: None,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Parameters of the most recent fit
    pub fn params(&self) -> Option<&LogisticParams> {
        self.params.as_ref()
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// ln(1 + e^z) without overflow
    fn softplus(z: f64) -> f64 {
        z.max(0.0) + (-z.abs()).exp().ln_1p()
    }

    /// Regularised mean log-loss
    fn objective(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, b: f64, penalty: f64) -> f64 {
        let z = x.dot(w) + b;
        let data_loss = z
            .iter()
            .zip(y.iter())
            .map(|(&zi, &yi)| Self::softplus(zi) - yi * zi)
            .sum::<f64>()
            / y.len() as f64;
        data_loss + 0.5 * penalty * w.dot(w)
    }

    fn standardise(features: ArrayView2<'_, f64>) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        let n_features = features.ncols();
        let mean = features
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let x = (&features - &mean) / &scale;
        (x, mean, scale)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl BinaryClassifier for LogisticRegression {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[usize]) -> EvalResult<()> {
        if features.nrows() != labels.len() {
            return Err(EvalError::InvalidInput(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(EvalError::InvalidInput("cannot fit on zero samples".into()));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l > 1) {
            return Err(EvalError::InvalidInput(format!(
                "label {bad} is not a binary class"
            )));
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(EvalError::InvalidInput(
                "training data contains a single class".into(),
            ));
        }
        if self.config.c <= 0.0 {
            return Err(EvalError::Config("classifier.c must be positive".into()));
        }

        // Discard anything learned by a previous fit before training.
        self.params = None;

        let n_samples = labels.len() as f64;
        let (x, mean, scale) = Self::standardise(features);
        let y: Array1<f64> = labels.iter().map(|&l| l as f64).collect();
        let penalty = 1.0 / (self.config.c * n_samples);

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.config.seed);
        let mut w = Array1::from_shape_fn(x.ncols(), |_| (rng.gen::<f64>() - 0.5) * 0.02);
        let mut b = 0.0;
        let mut loss = Self::objective(&x, &y, &w, b, penalty);
        let mut n_iter = 0;

        for _ in 0..self.config.max_iter {
            n_iter += 1;

            let p = (x.dot(&w) + b).mapv(Self::sigmoid);
            let residual = &p - &y;
            let grad_w = x.t().dot(&residual) / n_samples + &w * penalty;
            let grad_b = residual.sum() / n_samples;

            let grad_max = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if grad_max < self.config.tolerance {
                break;
            }

            let grad_sq = grad_w.dot(&grad_w) + grad_b * grad_b;
            let mut step = self.config.learning_rate;
            loop {
                let w_next = &w - &(&grad_w * step);
                let b_next = b - grad_b * step;
                let next_loss = Self::objective(&x, &y, &w_next, b_next, penalty);
                if next_loss <= loss - 0.5 * step * grad_sq || step < 1e-12 {
                    w = w_next;
                    b = b_next;
                    loss = next_loss;
                    break;
                }
                step *= 0.5;
            }
        }

        if n_iter == self.config.max_iter {
            tracing::trace!(n_iter, loss, "logistic regression hit the iteration cap");
        }

        self.params = Some(LogisticParams {
            weights: w,
            intercept: b,
            mean,
            scale,
            n_iter,
        });
        Ok(())
    }

    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> EvalResult<Array1<f64>> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| EvalError::InvalidInput("model is not fitted".into()))?;
        if features.ncols() != params.weights.len() {
            return Err(EvalError::InvalidInput(format!(
                "model was fitted on {} features, got {}",
                params.weights.len(),
                features.ncols()
            )));
        }
        let x = (&features - &params.mean) / &params.scale;
        Ok((x.dot(&params.weights) + params.intercept).mapv(Self::sigmoid))
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}
