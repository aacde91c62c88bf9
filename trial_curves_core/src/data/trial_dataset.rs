//! Trial dataset loading
//!
//! Each data row of the input file is one labeled trial:
//! `group_id, col1, col2, label, feature_0, ..., feature_{M-1}`.
//! The column positions live in [`TrialSchema`] so the layout is an explicit
//! contract rather than magic offsets scattered through the loader.

use std::collections::BTreeSet;
use std::path::Path;

use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// Column layout of a trial file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialSchema {
    /// Column holding the group id (kept as raw text)
    pub group_column: usize,
    /// Column holding the integer class label
    pub label_column: usize,
    /// First feature column; every column from here to the end is a feature
    pub feature_start: usize,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for TrialSchema {
    fn default() -> Self {
        Self {
            group_column: 0,
            label_column: 3,
            feature_start: 4,
            delimiter: b',',
        }
    }
}

/// A single labeled trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub group_id: String,
    pub label: usize,
    pub features: Vec<f64>,
}

/// Index-aligned features, labels and groups read from one file.
///
/// `features.row(i)`, `labels[i]` and `groups[i]` always describe the same
/// trial, and every row of `features` has the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialDataset {
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
    pub groups: Vec<String>,
}

impl TrialDataset {
    /// Build a dataset from already-aligned parts
    pub fn new(features: Array2<f64>, labels: Vec<usize>, groups: Vec<String>) -> EvalResult<Self> {
        if features.nrows() != labels.len() || labels.len() != groups.len() {
            return Err(EvalError::InvalidInput(format!(
                "misaligned dataset: {} feature rows, {} labels, {} groups",
                features.nrows(),
                labels.len(),
                groups.len()
            )));
        }
        Ok(Self {
            features,
            labels,
            groups,
        })
    }

    /// Load a trial file using the default column layout
    pub fn load<P: AsRef<Path>>(path: P) -> EvalResult<Self> {
        Self::load_with_schema(path, &TrialSchema::default())
    }

    /// Load a trial file.
    ///
    /// The header row is discarded without inspection. Any unparsable cell
    /// aborts the whole load, and so does a row whose feature width differs
    /// from the first row's. Group ids are kept verbatim, while label and
    /// feature cells may carry surrounding whitespace.
    pub fn load_with_schema<P: AsRef<Path>>(path: P, schema: &TrialSchema) -> EvalResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .delimiter(schema.delimiter)
            .from_path(path)
            .map_err(|err| csv_error(path, 0, err))?;

        let mut values: Vec<f64> = Vec::new();
        let mut labels = Vec::new();
        let mut groups = Vec::new();
        let mut width: Option<usize> = None;

        for (idx, record) in reader.records().enumerate() {
            let row = idx + 1;
            let record = record.map_err(|err| csv_error(path, row, err))?;
            let trial = parse_record(&record, row, schema)?;

            match width {
                None => width = Some(trial.features.len()),
                Some(expected) if expected != trial.features.len() => {
                    return Err(EvalError::SchemaMismatch {
                        row,
                        expected,
                        found: trial.features.len(),
                    });
                }
                Some(_) => {}
            }

            values.extend_from_slice(&trial.features);
            labels.push(trial.label);
            groups.push(trial.group_id);
        }

        let width = width.ok_or_else(|| EvalError::Parse {
            row: 0,
            column: 0,
            message: format!("{} contains no data rows", path.display()),
        })?;

        let features = Array2::from_shape_vec((labels.len(), width), values)
            .map_err(|err| EvalError::InvalidInput(err.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            trials = labels.len(),
            features = width,
            "loaded trial dataset"
        );

        Self::new(features, labels, groups)
    }

    /// Generate a seeded, grouped two-class dataset
    pub fn synthetic(config: &SyntheticConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let n_samples = config.n_groups * config.trials_per_group;

        // Fixed class direction so both classes differ along every feature
        let direction: Vec<f64> = (0..config.n_features)
            .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
            .collect();

        let mut rows: Vec<(String, usize, Vec<f64>)> = Vec::with_capacity(n_samples);
        for group in 0..config.n_groups {
            let group_id = format!("g{group}");
            let offset = (rng.gen::<f64>() - 0.5) * config.group_offset * 2.0;

            for trial in 0..config.trials_per_group {
                let label = (trial + group) % 2;
                let sign = if label == 1 { 1.0 } else { -1.0 };
                let features = direction
                    .iter()
                    .map(|&d| {
                        let noise = rng.gen::<f64>() * config.noise * 2.0 - config.noise;
                        sign * d * config.separation + offset + noise
                    })
                    .collect();
                rows.push((group_id.clone(), label, features));
            }
        }

        rows.shuffle(&mut rng);

        let mut values = Vec::with_capacity(n_samples * config.n_features);
        let mut labels = Vec::with_capacity(n_samples);
        let mut groups = Vec::with_capacity(n_samples);
        for (group_id, label, features) in rows {
            values.extend(features);
            labels.push(label);
            groups.push(group_id);
        }

        let features = Array2::from_shape_vec((n_samples, config.n_features), values)
            .unwrap_or_else(|_| Array2::zeros((n_samples, config.n_features)));

        Self {
            features,
            labels,
            groups,
        }
    }

    /// Number of trials
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature vector width
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> Vec<usize> {
        self.labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Row subset in the given index order
    pub fn select(&self, indices: &[usize]) -> TrialDataset {
        TrialDataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            groups: indices.iter().map(|&i| self.groups[i].clone()).collect(),
        }
    }

    /// Feature row of trial `idx`
    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.features.row(idx)
    }

    /// Reassemble trial `idx`
    pub fn trial(&self, idx: usize) -> Trial {
        Trial {
            group_id: self.groups[idx].clone(),
            label: self.labels[idx],
            features: self.features.row(idx).to_vec(),
        }
    }
}

/// Configuration for synthetic dataset generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub n_groups: usize,
    pub trials_per_group: usize,
    pub n_features: usize,
    /// Distance of each class mean from the origin along every feature
    pub separation: f64,
    /// Half-width of the uniform per-feature noise
    pub noise: f64,
    /// Half-width of the uniform per-group shift
    pub group_offset: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_groups: 10,
            trials_per_group: 20,
            n_features: 4,
            separation: 0.5,
            noise: 1.0,
            group_offset: 0.2,
            seed: 42,
        }
    }
}

fn parse_record(record: &csv::StringRecord, row: usize, schema: &TrialSchema) -> EvalResult<Trial> {
    let group_id = record
        .get(schema.group_column)
        .ok_or_else(|| missing_column(row, schema.group_column, record.len()))?
        .to_string();

    let label_cell = record
        .get(schema.label_column)
        .ok_or_else(|| missing_column(row, schema.label_column, record.len()))?
        .trim();
    let label = match label_cell.parse::<i64>() {
        Ok(0) => 0,
        Ok(1) => 1,
        Ok(other) => {
            return Err(EvalError::Parse {
                row,
                column: schema.label_column,
                message: format!("label {other} is not a binary class (expected 0 or 1)"),
            })
        }
        Err(err) => {
            return Err(EvalError::Parse {
                row,
                column: schema.label_column,
                message: format!("label {label_cell:?}: {err}"),
            })
        }
    };

    if record.len() <= schema.feature_start {
        return Err(EvalError::Parse {
            row,
            column: schema.feature_start,
            message: "row has no feature columns".into(),
        });
    }

    let features = record
        .iter()
        .enumerate()
        .skip(schema.feature_start)
        .map(|(column, cell)| {
            cell.trim().parse::<f64>().map_err(|err| EvalError::Parse {
                row,
                column,
                message: format!("feature {cell:?}: {err}"),
            })
        })
        .collect::<EvalResult<Vec<f64>>>()?;

    Ok(Trial {
        group_id,
        label,
        features,
    })
}

fn missing_column(row: usize, column: usize, found: usize) -> EvalError {
    EvalError::Parse {
        row,
        column,
        message: format!("row has only {found} columns"),
    }
}

fn csv_error(path: &Path, row: usize, err: csv::Error) -> EvalError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => EvalError::io(path, source),
        other => EvalError::Parse {
            row,
            column: 0,
            message: format!("{other:?}"),
        },
    }
}
