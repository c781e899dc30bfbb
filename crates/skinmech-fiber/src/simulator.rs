//! Simulation backends
//!
//! A [`Simulator`] turns one [`RunConfig`] into a [`TimeSeries`]. The
//! bundled [`CommandSimulator`] hands each run to an external solver
//! through a JSON job file and reads back the solver's CSV.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::RunConfig;

/// Column names of a run's time series, in file order.
pub const SERIES_COLUMNS: [&str; 6] = ["time", "force", "displ", "stress", "strain", "sener"];

pub trait Simulator {
    fn run(&mut self, run: &RunConfig) -> anyhow::Result<TimeSeries>;
}

/// Force and displacement at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaticPoint {
    pub displ: f64,
    pub force: f64,
}

/// Sampled response of one run. Always holds at least one sample of
/// equal-length finite columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    force: Vec<f64>,
    displ: Vec<f64>,
    stress: Vec<f64>,
    strain: Vec<f64>,
    sener: Vec<f64>,
}

impl TimeSeries {
    pub fn new(
        time: Vec<f64>,
        force: Vec<f64>,
        displ: Vec<f64>,
        stress: Vec<f64>,
        strain: Vec<f64>,
        sener: Vec<f64>,
    ) -> anyhow::Result<Self> {
        let series = Self {
            time,
            force,
            displ,
            stress,
            strain,
            sener,
        };
        series.validate()?;
        Ok(series)
    }

    pub fn from_rows(rows: &[[f64; 6]]) -> anyhow::Result<Self> {
        let column = |idx: usize| rows.iter().map(|r| r[idx]).collect::<Vec<_>>();
        Self::new(column(0), column(1), column(2), column(3), column(4), column(5))
    }

    fn columns(&self) -> [&[f64]; 6] {
        [
            &self.time,
            &self.force,
            &self.displ,
            &self.stress,
            &self.strain,
            &self.sener,
        ]
    }

    fn validate(&self) -> anyhow::Result<()> {
        let len = self.time.len();
        anyhow::ensure!(len > 0, "time series is empty");
        for (name, column) in SERIES_COLUMNS.iter().zip(self.columns()) {
            anyhow::ensure!(
                column.len() == len,
                "column {name} has {} samples, expected {len}",
                column.len()
            );
            if let Some(idx) = column.iter().position(|v| !v.is_finite()) {
                bail!("column {name} has a non-finite value at sample {idx}");
            }
        }
        Ok(())
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn force(&self) -> &[f64] {
        &self.force
    }

    pub fn displ(&self) -> &[f64] {
        &self.displ
    }

    pub fn stress(&self) -> &[f64] {
        &self.stress
    }

    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    pub fn sener(&self) -> &[f64] {
        &self.sener
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = [f64; 6]> + '_ {
        (0..self.len()).map(move |i| self.columns().map(|c| c[i]))
    }

    pub fn static_point(&self) -> StaticPoint {
        let last = self.len().saturating_sub(1);
        StaticPoint {
            displ: self.displ[last],
            force: self.force[last],
        }
    }

    /// Six-column CSV, with or without a header line. Only a first line
    /// with no numeric field counts as a header.
    pub fn read_csv(path: &Path) -> anyhow::Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open solver output {}", path.display()))?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if idx == 0 && record.iter().all(|field| field.parse::<f64>().is_err()) {
                continue;
            }
            let parsed: Result<Vec<f64>, _> = record.iter().map(str::parse::<f64>).collect();
            let values = match parsed {
                Ok(values) => values,
                Err(err) => bail!("line {} of {}: {err}", idx + 1, path.display()),
            };
            let row: [f64; 6] = values.as_slice().try_into().map_err(|_| {
                anyhow::anyhow!(
                    "line {} of {} has {} columns, expected 6",
                    idx + 1,
                    path.display(),
                    values.len()
                )
            })?;
            rows.push(row);
        }

        Self::from_rows(&rows).with_context(|| format!("invalid time series in {}", path.display()))
    }
}

/// Runs an external solver once per job.
///
/// The solver is invoked as `program args... <work_dir>/<job>.json` from
/// inside `work_dir` and must leave `<work_dir>/<job>.csv` behind.
#[derive(Debug, Clone)]
pub struct CommandSimulator {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// Read results already in `work_dir` without invoking the solver.
    pub read_existing: bool,
}

impl CommandSimulator {
    pub fn job_file(&self, run: &RunConfig) -> PathBuf {
        self.work_dir.join(format!("{}.json", run.job_name))
    }

    pub fn result_file(&self, run: &RunConfig) -> PathBuf {
        self.work_dir.join(format!("{}.csv", run.job_name))
    }

    fn invoke(&self, run: &RunConfig) -> anyhow::Result<()> {
        fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("failed to create work directory {}", self.work_dir.display())
        })?;

        let job_file = self.job_file(run);
        let job = serde_json::to_string_pretty(run)?;
        fs::write(&job_file, job)
            .with_context(|| format!("failed to write job file {}", job_file.display()))?;

        debug!(program = %self.program, job = %job_file.display(), "invoking solver");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&job_file)
            .current_dir(&self.work_dir)
            .status()
            .with_context(|| format!("failed to start solver '{}'", self.program))?;

        if !status.success() {
            bail!("solver exited with {status} for job {}", run.job_name);
        }
        Ok(())
    }
}

impl Simulator for CommandSimulator {
    fn run(&mut self, run: &RunConfig) -> anyhow::Result<TimeSeries> {
        if self.read_existing {
            info!(job = %run.job_name, "reading existing solver output");
        } else {
            self.invoke(run)?;
        }
        TimeSeries::read_csv(&self.result_file(run))
    }
}
