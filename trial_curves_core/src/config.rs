//! Report configuration via TOML files.
//!
//! Every section is optional. Missing keys fall back to the standard batch
//! run: two dataset variants, logistic regression with `max_iter = 1000`,
//! five group-aware folds and five training sizes from 10% to 100%.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::TrialSchema;
use crate::error::{EvalError, EvalResult};
use crate::learner::ClassifierConfig;
use crate::validation::{
    linspace, validate_fractions, EvaluatorConfig, LearningCurveSettings, RocSplit,
    SplitStrategy, Splitter,
};

/// Complete configuration of a report run.
///
/// # Examples
///
/// ```
/// use trial_curves_core::ReportConfig;
///
/// let config = ReportConfig::load_from_file("config/report.toml")
///     .unwrap_or_else(|_| ReportConfig::default());
///
/// println!("{} variants, {} folds", config.variants.len(), config.cross_validation.n_splits);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfig {
    pub classifier: ClassifierConfig,
    pub cross_validation: CrossValidationConfig,
    pub learning_curve: LearningCurveSettings,
    pub report: RenderConfig,
    pub schema: TrialSchema,
    /// Dataset variants, one figure column each, in order
    pub variants: Vec<VariantConfig>,
}

/// Splitting strategy and fold count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationConfig {
    pub strategy: SplitStrategy,
    pub n_splits: usize,
    /// Shuffle before cutting plain K-fold blocks
    pub shuffle: bool,
    pub seed: u64,
    pub roc_split: RocSplit,
}

/// Output figure settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderConfig {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Directory for the JSON-lines run log
    pub log_dir: PathBuf,
}

/// One named input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    pub name: String,
    pub path: PathBuf,
}

impl ReportConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> EvalResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| EvalError::io(path, err))?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> EvalResult<Self> {
        let raw: RawReportConfig =
            toml::from_str(toml_str).map_err(|err| EvalError::Config(err.to_string()))?;

        let config = Self {
            classifier: raw.classifier,
            cross_validation: CrossValidationConfig {
                strategy: raw.cross_validation.strategy,
                n_splits: raw.cross_validation.n_splits,
                shuffle: raw.cross_validation.shuffle,
                seed: raw.cross_validation.seed,
                roc_split: raw.cross_validation.roc_split,
            },
            learning_curve: LearningCurveSettings {
                train_sizes: raw.learning_curve.train_sizes,
                workers: raw.learning_curve.workers,
                seed: raw.learning_curve.seed,
            },
            report: RenderConfig {
                output_path: raw.report.output_path,
                width: raw.report.width,
                height: raw.report.height,
                log_dir: raw.report.log_dir,
            },
            schema: raw.schema.try_into_schema()?,
            variants: raw.variants.unwrap_or_else(default_variants),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, mid-run
    pub fn validate(&self) -> EvalResult<()> {
        let classifier = &self.classifier;
        if !(classifier.c.is_finite() && classifier.c > 0.0) {
            return Err(EvalError::Config("classifier.c must be positive".into()));
        }
        if classifier.max_iter == 0 {
            return Err(EvalError::Config("classifier.max_iter must be ≥ 1".into()));
        }
        if !(classifier.learning_rate.is_finite() && classifier.learning_rate > 0.0) {
            return Err(EvalError::Config(
                "classifier.learning_rate must be positive".into(),
            ));
        }
        if !(classifier.tolerance.is_finite() && classifier.tolerance >= 0.0) {
            return Err(EvalError::Config("classifier.tolerance must be ≥ 0".into()));
        }
        if self.cross_validation.n_splits < 2 {
            return Err(EvalError::Config(
                "cross_validation.n_splits must be ≥ 2".into(),
            ));
        }
        validate_fractions(&self.learning_curve.train_sizes)?;
        if self.report.width == 0 || self.report.height == 0 {
            return Err(EvalError::Config(
                "report.width and report.height must be non-zero".into(),
            ));
        }
        if self.variants.is_empty() {
            return Err(EvalError::Config("at least one variant is required".into()));
        }
        if let Some(variant) = self.variants.iter().find(|v| v.name.trim().is_empty()) {
            return Err(EvalError::Config(format!(
                "variant for {} has an empty name",
                variant.path.display()
            )));
        }
        Ok(())
    }

    /// Splitter shared by every variant
    pub fn splitter(&self) -> Splitter {
        let cv = &self.cross_validation;
        Splitter::new(cv.strategy, cv.n_splits, cv.shuffle, cv.seed)
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            learning_curve: self.learning_curve.clone(),
            roc_split: self.cross_validation.roc_split,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            cross_validation: CrossValidationConfig {
                strategy: default_strategy(),
                n_splits: default_n_splits(),
                shuffle: false,
                seed: 0,
                roc_split: RocSplit::default(),
            },
            learning_curve: LearningCurveSettings::default(),
            report: RenderConfig {
                output_path: default_output_path(),
                width: default_width(),
                height: default_height(),
                log_dir: default_log_dir(),
            },
            schema: TrialSchema::default(),
            variants: default_variants(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReportConfig {
    #[serde(default)]
    classifier: ClassifierConfig,
    #[serde(default)]
    cross_validation: RawCrossValidation,
    #[serde(default)]
    learning_curve: RawLearningCurve,
    #[serde(default)]
    report: RawReport,
    #[serde(default)]
    schema: RawSchema,
    variants: Option<Vec<VariantConfig>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCrossValidation {
    #[serde(default = "default_strategy")]
    strategy: SplitStrategy,
    #[serde(default = "default_n_splits")]
    n_splits: usize,
    #[serde(default)]
    shuffle: bool,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    roc_split: RocSplit,
}

impl Default for RawCrossValidation {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            n_splits: default_n_splits(),
            shuffle: false,
            seed: 0,
            roc_split: RocSplit::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLearningCurve {
    #[serde(default = "default_train_sizes")]
    train_sizes: Vec<f64>,
    #[serde(default)]
    workers: usize,
    #[serde(default)]
    seed: u64,
}

impl Default for RawLearningCurve {
    fn default() -> Self {
        Self {
            train_sizes: default_train_sizes(),
            workers: 0,
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReport {
    #[serde(default = "default_output_path")]
    output_path: PathBuf,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default = "default_log_dir")]
    log_dir: PathBuf,
}

impl Default for RawReport {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            width: default_width(),
            height: default_height(),
            log_dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    group_column: usize,
    #[serde(default = "default_label_column")]
    label_column: usize,
    #[serde(default = "default_feature_start")]
    feature_start: usize,
    #[serde(default = "default_delimiter")]
    delimiter: String,
}

impl Default for RawSchema {
    fn default() -> Self {
        Self {
            group_column: 0,
            label_column: default_label_column(),
            feature_start: default_feature_start(),
            delimiter: default_delimiter(),
        }
    }
}

impl RawSchema {
    fn try_into_schema(self) -> EvalResult<TrialSchema> {
        let delimiter = match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => {
                return Err(EvalError::Config(format!(
                    "schema.delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                )))
            }
        };
        if self.feature_start <= self.label_column || self.feature_start <= self.group_column {
            return Err(EvalError::Config(
                "schema.feature_start must come after the group and label columns".into(),
            ));
        }
        Ok(TrialSchema {
            group_column: self.group_column,
            label_column: self.label_column,
            feature_start: self.feature_start,
            delimiter,
        })
    }
}

fn default_strategy() -> SplitStrategy {
    SplitStrategy::GroupKFold
}

fn default_n_splits() -> usize {
    5
}

fn default_train_sizes() -> Vec<f64> {
    linspace(0.1, 1.0, 5)
}

fn default_output_path() -> PathBuf {
    PathBuf::from("present.png")
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    1500
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_label_column() -> usize {
    3
}

fn default_feature_start() -> usize {
    4
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_variants() -> Vec<VariantConfig> {
    vec![
        VariantConfig {
            name: "Raw audio".into(),
            path: PathBuf::from("../sheets/features.csv"),
        },
        VariantConfig {
            name: "With background noise reduction".into(),
            path: PathBuf::from("../sheets/spectral_dataset.csv"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_config_defaults_when_empty() {
        let config = ReportConfig::from_str("").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.variants.len(), 2);
        assert_eq!(config.cross_validation.n_splits, 5);
        assert_eq!(config.classifier.max_iter, 1000);
        assert_eq!(config.learning_curve.train_sizes.len(), 5);
        assert_eq!(config.schema, TrialSchema::default());
    }

    #[test]
    fn report_config_parses_full_file() {
        let toml = r#"
[classifier]
c = 0.5
max_iter = 200
seed = 3

[cross_validation]
strategy = "kfold"
n_splits = 3
shuffle = true
seed = 9
roc_split = "kfold"

[learning_curve]
train_sizes = [0.25, 0.5, 1.0]
workers = 2

[report]
output_path = "out/figure.png"
width = 800
height = 1200

[schema]
delimiter = ";"

[[variants]]
name = "Only"
path = "data/only.csv"
"#;
        let config = ReportConfig::from_str(toml).unwrap();
        assert_eq!(config.classifier.c, 0.5);
        assert_eq!(config.classifier.max_iter, 200);
        assert_eq!(config.classifier.seed, 3);
        assert_eq!(config.cross_validation.strategy, SplitStrategy::KFold);
        assert_eq!(config.cross_validation.roc_split, RocSplit::KFold);
        assert_eq!(config.learning_curve.train_sizes, vec![0.25, 0.5, 1.0]);
        assert_eq!(config.learning_curve.workers, 2);
        assert_eq!(config.report.output_path, PathBuf::from("out/figure.png"));
        assert_eq!(config.schema.delimiter, b';');
        assert_eq!(config.variants.len(), 1);
        assert!(!config.splitter().is_group_aware());
    }

    #[test]
    fn report_config_rejects_bad_values() {
        assert!(ReportConfig::from_str("[cross_validation]\nn_splits = 1").is_err());
        assert!(ReportConfig::from_str("[learning_curve]\ntrain_sizes = [0.5, 0.2]").is_err());
        assert!(ReportConfig::from_str("[classifier]\nc = 0.0").is_err());
        assert!(ReportConfig::from_str("[schema]\ndelimiter = \"::\"").is_err());
        assert!(ReportConfig::from_str("[schema]\nfeature_start = 2").is_err());
        assert!(ReportConfig::from_str("[cross_validation]\nstrategy = \"loo\"").is_err());
        assert!(ReportConfig::from_str("variants = []").is_err());
    }

    #[test]
    fn report_config_rejects_unknown_keys() {
        let result = ReportConfig::from_str("[report]\ndpi = 300");
        assert!(matches!(result, Err(EvalError::Config(_))));

        let result = ReportConfig::from_str("[classifier]\nmax_iters = 5");
        assert!(matches!(result, Err(EvalError::Config(_))));

        let toml = r#"
[[variants]]
name = "x"
path = "x.csv"
paht = "y"
"#;
        let result = ReportConfig::from_str(toml);
        assert!(matches!(result, Err(EvalError::Config(_))));
    }

    #[test]
    fn report_config_sample_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/report.toml");
        let config = ReportConfig::load_from_file(path).unwrap();
        assert_eq!(config.variants, ReportConfig::default().variants);
        assert_eq!(config.cross_validation, ReportConfig::default().cross_validation);
        assert_eq!(config.learning_curve.train_sizes.len(), 5);
        assert_eq!(config.schema, TrialSchema::default());
    }

    #[test]
    fn report_config_missing_file_is_io_error() {
        let result = ReportConfig::load_from_file("/nonexistent/report.toml");
        assert!(matches!(result, Err(EvalError::Io { .. })));
    }
}
