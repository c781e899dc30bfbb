//! Batch driver for mechanoreceptor fiber simulations.
//!
//! Reads a stimulus table, builds one job per row against a shared skin
//! material, hands each job to a [`Simulator`] and exports the static
//! force-displacement curve together with every run's time series.

pub mod config;
pub mod material;
pub mod model;
pub mod output;
pub mod simulator;
pub mod stimulus;

use std::path::Path;

use anyhow::Context;
use skinmech::output::{create_timestamped_run_dir, resolve_output_base_dir};
use skinmech::LinearFit;
use tracing::{debug, info};

pub use crate::model::{FiberModel, RunConfig, RunOutput};
pub use crate::simulator::{CommandSimulator, Simulator, StaticPoint, TimeSeries};

use crate::config::FiberConfig;
use crate::material::read_design_level;
use crate::model::static_curve;
use crate::output::{
    plot_force_displ, write_run_csv, write_static_csv, write_summary, FiberSummary, OutputFiles,
};
use crate::stimulus::read_stimulus_csv;

/// Build the model described by `cfg`, applying the design table if set.
pub fn build_model(cfg: &FiberConfig) -> anyhow::Result<FiberModel> {
    cfg.validate()?;
    let stimuli = read_stimulus_csv(&cfg.stimulus)?;

    let material = match &cfg.design_table {
        Some(path) => {
            let row = read_design_level(path, cfg.design_level)?;
            info!(table = %path.display(), level = cfg.design_level, "material from design table");
            cfg.material.with_design_level(&row)
        }
        None => cfg.material,
    };

    FiberModel::new(&cfg.base_model_name, &cfg.suffix, &stimuli, material)
}

pub fn command_simulator(cfg: &FiberConfig) -> CommandSimulator {
    CommandSimulator {
        program: cfg.solver.clone(),
        args: cfg.solver_args.clone(),
        work_dir: cfg.work_dir.clone(),
        read_existing: cfg.read_existing,
    }
}

/// Run the batch through the configured external solver.
pub fn run_fiber(cfg: &FiberConfig, output_base: &Path) -> anyhow::Result<FiberSummary> {
    let mut simulator = command_simulator(cfg);
    run_fiber_with(cfg, &mut simulator, output_base)
}

pub fn run_fiber_with<S: Simulator + ?Sized>(
    cfg: &FiberConfig,
    simulator: &mut S,
    output_base: &Path,
) -> anyhow::Result<FiberSummary> {
    let model = build_model(cfg)?;
    info!(runs = model.runs.len(), base = %model.base_model_name, "fiber model ready");

    let outputs = model.run(simulator)?;
    let curve = static_curve(&outputs);

    let displ: Vec<f64> = curve.iter().map(|p| p.displ).collect();
    let force: Vec<f64> = curve.iter().map(|p| p.force).collect();
    let stiffness = match LinearFit::fit(&displ, &force) {
        Ok(fit) => Some(fit),
        Err(err) => {
            debug!(%err, "no force-displacement fit");
            None
        }
    };

    let base_dir = resolve_output_base_dir(output_base);
    let output_dir = create_timestamped_run_dir(&base_dir)
        .with_context(|| format!("failed to create run directory under {}", base_dir.display()))?;
    let files = OutputFiles::new(&output_dir, &model.base_model_name, outputs.len());

    write_static_csv(&files.static_csv, &curve)?;
    for (path, output) in files.run_csvs.iter().zip(&outputs) {
        write_run_csv(path, output)?;
    }
    if cfg.make_plots {
        plot_force_displ(&curve, &files.plot_path)?;
    }

    let summary = FiberSummary {
        config: cfg.clone(),
        runs: outputs.len(),
        job_names: model.runs.iter().map(|r| r.job_name.clone()).collect(),
        static_curve: curve,
        stiffness,
        outputs: files.clone(),
    };
    write_summary(&files.summary_path, &summary)?;

    Ok(summary)
}
