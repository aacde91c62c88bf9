//! Report rendering: a 3-row figure with one column per dataset variant.
//!
//! Rows are the learning curve, the per-fold ROC curves and the fit-time vs.
//! score trade-off.

pub mod figure;
pub mod series;

pub use figure::{draw_column, render_report};
pub use series::{BandSeries, LearningCurvePanel, RocPanel, TradeoffPanel, VariantReport};
