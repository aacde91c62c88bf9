use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::validation::{FoldRoc, LearningCurveRow};

/// Install the `tracing` subscriber used by the binary.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this twice
/// is harmless; the second call leaves the first subscriber in place.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

/// Append-only JSON-lines log of one report run
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Create `dir` if needed and log to `dir/evaluation.jsonl`
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join("evaluation.jsonl"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_learning_curve_row(&self, variant: &str, row: &LearningCurveRow) -> io::Result<()> {
        let entry = LearningCurveLogEntry {
            kind: "learning_curve",
            variant,
            train_size: row.train_size,
            fraction: row.fraction,
            train_score_mean: row.train_score.mean,
            train_score_std: row.train_score.std,
            test_score_mean: row.test_score.mean,
            test_score_std: row.test_score.std,
            fit_time_mean: row.fit_time.mean,
            fit_time_std: row.fit_time.std,
            timestamp_ms: timestamp_ms(),
        };
        append_json_line(&self.path, &entry)
    }

    pub fn log_fold_roc(&self, variant: &str, roc: &FoldRoc) -> io::Result<()> {
        let entry = RocLogEntry {
            kind: "roc",
            variant,
            fold: roc.fold,
            auc: roc.curve.auc,
            points: roc.curve.fpr.len(),
            timestamp_ms: timestamp_ms(),
        };
        append_json_line(&self.path, &entry)
    }
}

#[derive(Debug, Serialize)]
pub struct LearningCurveLogEntry<'a> {
    pub kind: &'static str,
    pub variant: &'a str,
    pub train_size: usize,
    pub fraction: f64,
    pub train_score_mean: f64,
    pub train_score_std: f64,
    pub test_score_mean: f64,
    pub test_score_std: f64,
    pub fit_time_mean: f64,
    pub fit_time_std: f64,
    pub timestamp_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct RocLogEntry<'a> {
    pub kind: &'static str,
    pub variant: &'a str,
    pub fold: usize,
    pub auc: f64,
    pub points: usize,
    pub timestamp_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{roc_curve, MeanStd};

    #[test]
    fn test_run_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::open(dir.path().join("logs")).unwrap();

        let stats = MeanStd { mean: 0.5, std: 0.1 };
        let row = LearningCurveRow {
            fraction: 0.1,
            train_size: 12,
            train_score: stats,
            test_score: stats,
            fit_time: stats,
            score_time: stats,
            fold_train_scores: vec![],
            fold_test_scores: vec![],
            fold_fit_times: vec![],
        };
        log.log_learning_curve_row("Raw audio", &row).unwrap();
        let roc = FoldRoc {
            fold: 1,
            curve: roc_curve(&[0.9, 0.1], &[1, 0]).unwrap(),
        };
        log.log_fold_roc("Raw audio", &roc).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "learning_curve");
        assert_eq!(lines[0]["train_size"], 12);
        assert_eq!(lines[1]["kind"], "roc");
        assert_eq!(lines[1]["auc"], 1.0);
    }
}
