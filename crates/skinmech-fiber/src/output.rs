//! Per-run time series, static curve CSV, force-displacement plot and
//! run summary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use plotters::prelude::*;
use serde::Serialize;
use skinmech::output::headerless_writer;
use skinmech::LinearFit;

use crate::config::FiberConfig;
use crate::model::RunOutput;
use crate::simulator::StaticPoint;

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub static_csv: PathBuf,
    pub run_csvs: Vec<PathBuf>,
    pub plot_path: PathBuf,
    pub summary_path: PathBuf,
}

impl OutputFiles {
    pub fn new(output_dir: &Path, base_model_name: &str, runs: usize) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            static_csv: output_dir.join(format!("{base_model_name}StaticForceDispl.csv")),
            run_csvs: (0..runs)
                .map(|i| output_dir.join(format!("{base_model_name}Output{i}.csv")))
                .collect(),
            plot_path: output_dir.join("force_displ.png"),
            summary_path: output_dir.join("summary.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FiberSummary {
    pub config: FiberConfig,
    pub runs: usize,
    pub job_names: Vec<String>,
    pub static_curve: Vec<StaticPoint>,
    /// Linear force-displacement fit across runs, when it is defined.
    pub stiffness: Option<LinearFit>,
    pub outputs: OutputFiles,
}

/// Header-less `displ, force` rows, one per run.
pub fn write_static_csv(path: &Path, curve: &[StaticPoint]) -> anyhow::Result<()> {
    let mut writer = headerless_writer(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for point in curve {
        writer.write_record([format!("{:e}", point.displ), format!("{:e}", point.force)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Header-less `time, force, displ, stress, strain, sener` rows.
pub fn write_run_csv(path: &Path, output: &RunOutput) -> anyhow::Result<()> {
    let mut writer = headerless_writer(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for row in output.series.rows() {
        writer.write_record(row.iter().map(|v| format!("{v:e}")))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &FiberSummary) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn plot_force_displ(curve: &[StaticPoint], path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(!curve.is_empty(), "static curve is empty");

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = padded_range(curve.iter().map(|p| p.displ));
    let (y_min, y_max) = padded_range(curve.iter().map(|p| p.force));

    let mut chart = ChartBuilder::on(&root)
        .caption("Static force-displacement", ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Displacement (mm)")
        .y_desc("Force")
        .draw()?;

    chart.draw_series(LineSeries::new(
        curve.iter().map(|p| (p.displ, p.force)),
        &BLUE,
    ))?;
    chart.draw_series(
        curve
            .iter()
            .map(|p| Circle::new((p.displ, p.force), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((hi - lo) * 0.05).max(1e-9).max(hi.abs().max(lo.abs()) * 0.05);
    (lo.min(0.0) - pad, hi + pad)
}
