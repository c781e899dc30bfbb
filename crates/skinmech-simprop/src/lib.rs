//! Skin property summaries, simulation design tables and representative
//! sampling over a fitted viscoelastic parameter population.

pub mod config;
pub mod design;
pub mod mat;
pub mod output;
pub mod plots;
pub mod sampling;

use std::path::Path;

use anyhow::Context;
use csv::ReaderBuilder;
use skinmech::output::{create_timestamped_run_dir, resolve_output_base_dir};
use skinmech::ParameterTable;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::design::{design_properties, relaxation_designs, PropertySummaries};
use crate::output::{
    write_greedy_csv, write_random_trace_csv, write_relaxation_designs, write_simprop_csv,
    write_simprop_table_csv, write_summary, OutputFiles, Summary,
};
use crate::sampling::run_sampling;

/// Load the 12-column parameter matrix from a MAT-file (level 5 or 4) or a
/// header-less CSV file.
pub fn load_parameter_table(cfg: &AnalysisConfig) -> anyhow::Result<ParameterTable> {
    let path = &cfg.input;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        read_csv_matrix(path)?
    } else {
        mat::read_matrix(path, &cfg.variable)?
    };

    let table = ParameterTable::from_rows(&rows)
        .with_context(|| format!("invalid parameter matrix in {}", path.display()))?;
    info!(specimens = table.len(), input = %path.display(), "loaded parameter table");
    Ok(table)
}

fn read_csv_matrix(path: &Path) -> anyhow::Result<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<Vec<f64>>().enumerate() {
        let row = record.with_context(|| format!("bad row {} in {}", idx + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Full analysis: design tables, relaxation designs, sampling, plots and
/// a JSON summary in a fresh timestamped directory under `output_base`.
pub fn run_analysis(cfg: &AnalysisConfig, output_base: &Path) -> anyhow::Result<Summary> {
    cfg.validate()?;

    let mut table = load_parameter_table(cfg)?;
    anyhow::ensure!(
        table.len() >= 2,
        "need at least 2 specimens, {} has {}",
        cfg.input.display(),
        table.len()
    );
    anyhow::ensure!(
        cfg.greedy_steps <= table.len(),
        "greedy_steps ({}) exceeds the {} specimens in {}",
        cfg.greedy_steps,
        table.len(),
        cfg.input.display()
    );
    table.scale_thickness(cfg.thickness_scale);

    let base_dir = resolve_output_base_dir(output_base);
    let output_dir = create_timestamped_run_dir(&base_dir)
        .with_context(|| format!("failed to create run directory under {}", base_dir.display()))?;
    let files = OutputFiles::in_dir(&output_dir);

    let summaries = PropertySummaries::from_table(&table)?;
    let design = design_properties(&table, &summaries, cfg)?;
    info!(
        slope = design.ginf_to_g1.slope,
        intercept = design.ginf_to_g1.intercept,
        r = design.ginf_to_g1.r_value,
        p = ?design.ginf_to_g1.p_value,
        "ginf to g1 fit"
    );
    write_simprop_csv(&files.simprop_csv, &design)?;
    write_simprop_table_csv(&files.simprop_table_csv, &design)?;

    let designs = relaxation_designs(&table, &design.thickness, &design.ginf_to_g1)?;
    write_relaxation_designs(&files, &designs)?;

    let report = run_sampling(
        &table,
        cfg.sample_size,
        &cfg.iteration_budgets(),
        cfg.greedy_steps,
        cfg.seed,
    )?;
    write_random_trace_csv(&files.random_trace_csv, &report.trace)?;
    write_greedy_csv(&files.greedy_csv, &report.greedy)?;

    if cfg.make_plots {
        plots::plot_property_boxes(&table, &design, &files.boxplot_png)?;
        plots::plot_random_trace(&report.trace, &files.random_trace_png)?;
    } else {
        info!("plots disabled");
    }

    let summary = Summary {
        config: cfg.clone(),
        specimens: table.len(),
        summaries,
        ginf_to_g1: design.ginf_to_g1,
        observed_ginf_min: design.observed_ginf_min,
        thickness_to_ginf: designs.thickness_to_ginf,
        thickness_to_g1: designs.thickness_to_g1,
        ginf_residuals: designs.ginf_residuals,
        best_random_search: report.best,
        greedy_indices: report.greedy.iter().map(|r| r.row_index).collect(),
        outputs: files.clone(),
    };
    write_summary(&files.summary_json, &summary)?;

    Ok(summary)
}
