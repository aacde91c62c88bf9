//! Learning-curve report for trial feature tables.
//!
//! Usage: `learning-report [config.toml]`
//!
//! Without an argument the built-in defaults are used (two variants read from
//! `../sheets/`, figure written to `present.png`).

use anyhow::{Context, Result};
use trial_curves_core::{init_tracing, pipeline, ReportConfig};

fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::args_os().nth(1) {
        Some(path) => ReportConfig::load_from_file(&path)
            .with_context(|| format!("loading config {}", path.to_string_lossy()))?,
        None => {
            tracing::info!("no config given, using defaults");
            ReportConfig::default()
        }
    };

    println!("Learning-curve report");
    println!("=====================\n");
    println!("Configuration:");
    println!("  Strategy: {:?}", config.cross_validation.strategy);
    println!("  Folds: {}", config.cross_validation.n_splits);
    println!("  Train sizes: {:?}", config.learning_curve.train_sizes);
    println!("  C: {}", config.classifier.c);
    for variant in &config.variants {
        println!("  Variant '{}': {}", variant.name, variant.path.display());
    }
    println!();

    let summary = pipeline::run(&config).context("report run failed")?;

    println!("Results:");
    for variant in &summary.variants {
        let auc = variant
            .mean_auc
            .map(|auc| format!("{auc:.3}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:<32} trials={:<5} groups={:<4} features={:<4} test score={:.3} mean AUC={}",
            variant.name,
            variant.trials,
            variant.groups,
            variant.features,
            variant.final_test_score,
            auc
        );
    }
    println!();
    println!("Figure: {}", summary.output_path.display());
    println!("Run log: {}", summary.run_log.display());

    Ok(())
}
