//! PNG rendering of the 3 × N report figure with plotters.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::series::{BandSeries, LearningCurvePanel, RocPanel, TradeoffPanel, VariantReport};
use crate::config::RenderConfig;
use crate::error::{EvalError, EvalResult};

const ROWS: usize = 3;
const TRAIN_COLOR: RGBColor = RED;
const TEST_COLOR: RGBColor = GREEN;
const TRADEOFF_COLOR: RGBColor = BLUE;

fn render_err<E: std::fmt::Display>(err: E) -> EvalError {
    EvalError::Render(err.to_string())
}

/// Sibling path the figure is drawn to before being moved into place
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "figure.png".to_string());
    path.with_file_name(format!(".partial-{name}"))
}

/// Draw the 3 × N figure (one column per variant) and write it to
/// `config.output_path`.
///
/// The image is drawn to a staging file and renamed into place only after
/// every panel rendered, so a failure never leaves a partial figure behind.
pub fn render_report(variants: &[VariantReport], config: &RenderConfig) -> EvalResult<()> {
    if variants.is_empty() {
        return Err(EvalError::Config("nothing to render: no variants".into()));
    }

    let path = config.output_path.as_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| EvalError::io(parent, err))?;
    }
    write_staged(path, |staging| {
        draw_figure(staging, variants, (config.width, config.height))
    })?;
    tracing::info!(path = %path.display(), "figure written");
    Ok(())
}

/// Run `draw` against the staging sibling of `path`, then move the result
/// into place. On failure the staging file is removed and `path` is untouched.
fn write_staged<F>(path: &Path, draw: F) -> EvalResult<()>
where
    F: FnOnce(&Path) -> EvalResult<()>,
{
    let staging = staging_path(path);
    if let Err(err) = draw(&staging) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path).map_err(|err| EvalError::io(path, err))
}

fn draw_figure(path: &Path, variants: &[VariantReport], size: (u32, u32)) -> EvalResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let columns = variants.len();
    let cells = root.split_evenly((ROWS, columns));
    for (col, variant) in variants.iter().enumerate() {
        draw_column(
            [&cells[col], &cells[columns + col], &cells[2 * columns + col]],
            variant,
        )?;
    }

    root.present().map_err(render_err)
}

/// Draw one variant's three panels into its column
pub fn draw_column<DB: DrawingBackend>(
    cells: [&DrawingArea<DB, Shift>; ROWS],
    variant: &VariantReport,
) -> EvalResult<()> {
    let evaluation = &variant.evaluation;
    draw_learning_curve(
        cells[0],
        &LearningCurvePanel::from_evaluation(&variant.name, evaluation),
    )?;
    draw_roc(cells[1], &RocPanel::from_evaluation(evaluation))?;
    draw_tradeoff(cells[2], &TradeoffPanel::from_evaluation(evaluation))
}

fn draw_band<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    series: &BandSeries,
    color: RGBColor,
    labelled: bool,
) -> EvalResult<()> {
    chart
        .draw_series(std::iter::once(Polygon::new(
            series.band.clone(),
            color.mix(0.1).filled(),
        )))
        .map_err(render_err)?;

    let line = chart
        .draw_series(LineSeries::new(series.mean.iter().copied(), color.stroke_width(2)))
        .map_err(render_err)?;
    if labelled {
        line.label(series.label).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
        });
    }

    chart
        .draw_series(
            series
                .mean
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )
        .map_err(render_err)?;
    Ok(())
}

fn draw_learning_curve<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &LearningCurvePanel,
) -> EvalResult<()> {
    let (y_lo, y_hi) = panel.y_range();
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(panel.x_range.0..panel.x_range.1, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Training examples")
        .y_desc("Score")
        .draw()
        .map_err(render_err)?;

    draw_band(&mut chart, &panel.train, TRAIN_COLOR, true)?;
    draw_band(&mut chart, &panel.test, TEST_COLOR, true)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)
}

fn draw_roc<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &RocPanel) -> EvalResult<()> {
    let mut chart = ChartBuilder::on(area)
        .caption("ROC", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0f64..1.0f64, 0.0f64..1.0f64)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()
        .map_err(render_err)?;

    for (idx, (label, points)) in panel.lines.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    // Dashed diagonal for a classifier no better than chance
    let dashes = 25;
    chart
        .draw_series((0..dashes).map(|i| {
            let start = i as f64 / dashes as f64;
            let end = start + 0.5 / dashes as f64;
            PathElement::new(vec![(start, start), (end, end)], BLACK.stroke_width(2))
        }))
        .map_err(render_err)?
        .label("Random Guess")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)
}

fn draw_tradeoff<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &TradeoffPanel,
) -> EvalResult<()> {
    let (y_lo, y_hi) = panel.y_range();
    let mut chart = ChartBuilder::on(area)
        .caption("Performance of the model", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(panel.x_range.0..panel.x_range.1, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("fit_times")
        .y_desc("Score")
        .draw()
        .map_err(render_err)?;

    draw_band(&mut chart, &panel.score, TRADEOFF_COLOR, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticConfig, TrialDataset};
    use crate::learner::LogisticRegression;
    use crate::validation::{CurveEvaluator, GroupKFold};

    #[test]
    fn test_staging_path_is_sibling() {
        let staged = staging_path(Path::new("out/present.png"));
        assert_eq!(staged, PathBuf::from("out/.partial-present.png"));
        assert_eq!(staged.extension().unwrap(), "png");
    }

    #[test]
    fn test_render_requires_variants() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            output_path: dir.path().join("present.png"),
            width: 200,
            height: 300,
            log_dir: dir.path().join("logs"),
        };
        assert!(matches!(
            render_report(&[], &config),
            Err(EvalError::Config(_))
        ));
        assert!(!config.output_path.exists());
    }

    /// Draws a text-free image, so no system font is needed
    fn draw_blank(path: &Path) -> EvalResult<()> {
        let root = BitMapBackend::new(path, (40, 60)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let cells = root.split_evenly((ROWS, 2));
        cells[3].fill(&RED.mix(0.5)).map_err(render_err)?;
        root.present().map_err(render_err)
    }

    #[test]
    fn test_staged_write_moves_png_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("present.png");

        write_staged(&output, draw_blank).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(!staging_path(&output).exists());
    }

    #[test]
    fn test_staged_write_failure_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("present.png");
        fs::write(&output, b"previous").unwrap();

        let result = write_staged(&output, |staging| {
            draw_blank(staging)?;
            Err(EvalError::Render("backend failed".into()))
        });

        assert!(matches!(result, Err(EvalError::Render(_))));
        assert_eq!(fs::read(&output).unwrap(), b"previous");
        assert!(!staging_path(&output).exists());
    }

    #[test]
    #[ignore = "text rendering needs a system sans-serif font"]
    fn test_render_writes_png() {
        let dataset = TrialDataset::synthetic(&SyntheticConfig::default());
        let evaluation = CurveEvaluator::default()
            .evaluate(
                &mut LogisticRegression::default(),
                &dataset,
                &GroupKFold::new(5),
            )
            .unwrap();
        let variants = vec![
            VariantReport {
                name: "A".into(),
                evaluation: evaluation.clone(),
            },
            VariantReport {
                name: "B".into(),
                evaluation,
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            output_path: dir.path().join("present.png"),
            width: 600,
            height: 900,
            log_dir: dir.path().join("logs"),
        };

        render_report(&variants, &config).unwrap();
        assert!(config.output_path.exists());
        assert!(!staging_path(&config.output_path).exists());
    }
}
