//! Error types for loading, evaluation and reporting.
//!
//! Every failure aborts the run. There is no partial-result recovery, so the
//! variants carry enough context (row, column, fold) to fix the input and
//! rerun.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used throughout the crate
pub type EvalResult<T> = Result<T, EvalError>;

/// Error taxonomy for a report run
#[derive(Debug, Error)]
pub enum EvalError {
    /// Input file missing or unreadable, or output could not be written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-numeric cell or malformed row. `row` is 1-based and counts data
    /// rows only (the header is not numbered).
    #[error("parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// A row's feature vector width differs from the first row's
    #[error("schema mismatch at row {row}: expected {expected} features, found {found}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A fold cannot be scored meaningfully (single class on one side)
    #[error("degenerate fold {fold}: {reason}")]
    DegenerateFold { fold: usize, reason: String },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Data handed to the evaluator cannot be split or scored
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Plotting backend failure
    #[error("render error: {0}")]
    Render(String),
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = EvalError::SchemaMismatch {
            row: 7,
            expected: 4,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch at row 7: expected 4 features, found 3"
        );

        let err = EvalError::DegenerateFold {
            fold: 2,
            reason: "training subset contains only class 1".into(),
        };
        assert!(err.to_string().starts_with("degenerate fold 2"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = EvalError::io(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.csv"));
    }
}
