//! End-to-end report run: load → evaluate → render.
//!
//! All variants are evaluated before anything is drawn, so an error in any
//! of them aborts the run without touching the output image.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{ReportConfig, VariantConfig};
use crate::data::TrialDataset;
use crate::error::{EvalError, EvalResult};
use crate::learner::LogisticRegression;
use crate::logging::RunLog;
use crate::report::{render_report, VariantReport};
use crate::validation::{CurveEvaluator, Splitter};

/// What a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub output_path: PathBuf,
    pub run_log: PathBuf,
    pub variants: Vec<VariantSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantSummary {
    pub name: String,
    pub trials: usize,
    pub features: usize,
    pub groups: usize,
    /// Mean test score at the largest training size
    pub final_test_score: f64,
    pub mean_auc: Option<f64>,
}

/// Run the whole report described by `config`
pub fn run(config: &ReportConfig) -> EvalResult<ReportSummary> {
    config.validate()?;
    let splitter = config.splitter();
    let evaluator = CurveEvaluator::new(config.evaluator_config());
    let run_log = RunLog::open(&config.report.log_dir)
        .map_err(|err| EvalError::io(&config.report.log_dir, err))?;

    tracing::info!(
        variants = config.variants.len(),
        folds = config.cross_validation.n_splits,
        group_aware = splitter.is_group_aware(),
        "starting report run"
    );

    let mut reports = Vec::with_capacity(config.variants.len());
    let mut summaries = Vec::with_capacity(config.variants.len());
    for variant in &config.variants {
        let (report, summary) = evaluate_variant(variant, config, &splitter, &evaluator, &run_log)?;
        reports.push(report);
        summaries.push(summary);
    }

    render_report(&reports, &config.report)?;

    Ok(ReportSummary {
        output_path: config.report.output_path.clone(),
        run_log: run_log.path().to_path_buf(),
        variants: summaries,
    })
}

/// Load and evaluate one variant with its own model instance
pub fn evaluate_variant(
    variant: &VariantConfig,
    config: &ReportConfig,
    splitter: &Splitter,
    evaluator: &CurveEvaluator,
    run_log: &RunLog,
) -> EvalResult<(VariantReport, VariantSummary)> {
    tracing::info!(variant = %variant.name, path = %variant.path.display(), "loading dataset");
    let dataset = TrialDataset::load_with_schema(&variant.path, &config.schema)?;
    let groups = {
        let mut distinct: Vec<&str> = dataset.groups.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    };

    let mut model = LogisticRegression::new(config.classifier.clone());
    let evaluation = evaluator.evaluate(&mut model, &dataset, splitter)?;

    let log_err = |err| EvalError::io(run_log.path(), err);
    for row in &evaluation.learning_curve.rows {
        run_log
            .log_learning_curve_row(&variant.name, row)
            .map_err(log_err)?;
    }
    for roc in &evaluation.roc {
        run_log.log_fold_roc(&variant.name, roc).map_err(log_err)?;
    }

    let summary = VariantSummary {
        name: variant.name.clone(),
        trials: dataset.len(),
        features: dataset.n_features(),
        groups,
        final_test_score: evaluation
            .learning_curve
            .rows
            .last()
            .map(|row| row.test_score.mean)
            .unwrap_or(0.0),
        mean_auc: evaluation.roc_summary.map(|s| s.mean_auc),
    };

    Ok((
        VariantReport {
            name: variant.name.clone(),
            evaluation,
        },
        summary,
    ))
}
