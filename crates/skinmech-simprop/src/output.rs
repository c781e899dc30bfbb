//! Result files of one analysis run: header-less design CSVs, the
//! sampling tables and `summary.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use skinmech::output::headerless_writer;
use skinmech::{FiveNumberSummary, LinearFit, RandomSearchResult};

use crate::config::AnalysisConfig;
use crate::design::{DesignProperties, PropertySummaries, RelaxationDesign, RelaxationDesigns};
use crate::sampling::{GreedyRow, TracePoint};

/// Paths of everything one analysis run writes.
#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub simprop_csv: PathBuf,
    pub simprop_table_csv: PathBuf,
    pub rathickg_csv: PathBuf,
    pub raindg_csv: PathBuf,
    pub random_trace_csv: PathBuf,
    pub greedy_csv: PathBuf,
    pub summary_json: PathBuf,
    pub boxplot_png: PathBuf,
    pub random_trace_png: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            simprop_csv: output_dir.join("simprop.csv"),
            simprop_table_csv: output_dir.join("simprop_table.csv"),
            rathickg_csv: output_dir.join("rathickg.csv"),
            raindg_csv: output_dir.join("raindg.csv"),
            random_trace_csv: output_dir.join("random_search_trace.csv"),
            greedy_csv: output_dir.join("greedy_sample.csv"),
            summary_json: output_dir.join("summary.json"),
            boxplot_png: output_dir.join("boxplot_prop.png"),
            random_trace_png: output_dir.join("random_search_trace.png"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: AnalysisConfig,
    pub specimens: usize,
    pub summaries: PropertySummaries,
    pub ginf_to_g1: LinearFit,
    pub observed_ginf_min: f64,
    pub thickness_to_ginf: LinearFit,
    pub thickness_to_g1: LinearFit,
    pub ginf_residuals: FiveNumberSummary,
    pub best_random_search: Option<RandomSearchResult>,
    pub greedy_indices: Vec<usize>,
    pub outputs: OutputFiles,
}

fn fmt_f64(value: f64) -> String {
    format!("{value:e}")
}

fn fmt_option_f64(value: Option<f64>) -> String {
    value.map(fmt_f64).unwrap_or_default()
}

/// Header-less design table: one row per level, one column per property.
pub fn write_simprop_csv(path: &Path, design: &DesignProperties) -> anyhow::Result<()> {
    let columns = design.columns();
    let mut writer = headerless_writer(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for level in 0..5 {
        writer.write_record(columns.iter().map(|(_, values)| fmt_f64(values[level])))?;
    }
    writer.flush()?;
    Ok(())
}

/// Spreadsheet-style mirror of the design table, with index and headers.
pub fn write_simprop_table_csv(path: &Path, design: &DesignProperties) -> anyhow::Result<()> {
    let columns = design.columns();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;

    let mut header = vec![String::new()];
    header.extend(columns.iter().map(|(name, _)| name.to_string()));
    writer.write_record(&header)?;

    for level in 0..5 {
        let mut record = vec![level.to_string()];
        record.extend(columns.iter().map(|(_, values)| values[level].to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Header-less `g1, g2, ginf` rows.
pub fn write_relaxation_csv(path: &Path, design: &RelaxationDesign) -> anyhow::Result<()> {
    let mut writer = headerless_writer(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for level in 0..5 {
        writer.write_record([
            fmt_f64(design.g1[level]),
            fmt_f64(design.g2[level]),
            fmt_f64(design.ginf[level]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_relaxation_designs(
    files: &OutputFiles,
    designs: &RelaxationDesigns,
) -> anyhow::Result<()> {
    write_relaxation_csv(&files.rathickg_csv, &designs.by_thickness)?;
    write_relaxation_csv(&files.raindg_csv, &designs.individual)?;
    Ok(())
}

pub fn write_random_trace_csv(path: &Path, trace: &[TracePoint]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    writer.write_record(["iterations", "residual"])?;
    for point in trace {
        writer.write_record([point.iterations.to_string(), fmt_f64(point.residual)])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_greedy_csv(path: &Path, rows: &[GreedyRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    writer.write_record(["step", "row_index", "skin_id", "residual"])?;
    for row in rows {
        writer.write_record([
            row.step.to_string(),
            row.row_index.to_string(),
            row.skin_id.to_string(),
            fmt_option_f64(row.residual),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &Summary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxation_csv_has_three_columns_and_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.csv");
        let design = RelaxationDesign {
            g1: [0.1, 0.2, 0.3, 0.4, 0.5],
            g2: [0.5; 5],
            ginf: [0.4, 0.3, 0.2, 0.1, 0.0],
        };
        write_relaxation_csv(&path, &design).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        let first: Vec<f64> = lines[0].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(first, vec![0.1, 0.5, 0.4]);
    }

    #[test]
    fn greedy_csv_leaves_first_residual_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greedy.csv");
        let rows = [
            GreedyRow {
                step: 1,
                row_index: 4,
                skin_id: 12.0,
                residual: None,
            },
            GreedyRow {
                step: 2,
                row_index: 0,
                skin_id: 3.0,
                residual: Some(0.5),
            },
        ];
        write_greedy_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,row_index,skin_id,residual");
        assert_eq!(lines[1], "1,4,12,");
        assert_eq!(lines[2], "2,0,3,5e-1");
    }
}
