use std::path::PathBuf;

use clap::Parser;
use skinmech_fiber::config::FiberConfig;
use skinmech_fiber::run_fiber;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Batch mechanoreceptor fiber simulations")]
struct Cli {
    /// JSON configuration file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stimulus table (headed CSV)
    #[arg(long)]
    stimulus: Option<PathBuf>,

    /// Prefix of job and output file names
    #[arg(long)]
    base_model_name: Option<String>,

    /// Solver executable
    #[arg(long)]
    solver: Option<String>,

    /// Solver argument placed before the job file (repeatable)
    #[arg(long = "solver-arg")]
    solver_args: Vec<String>,

    /// Directory for job files and solver results
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Output base directory
    #[arg(long, default_value = "output-skinmech-fiber")]
    output: PathBuf,

    /// Read results already in the work directory instead of running the solver
    #[arg(long)]
    read_existing: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => FiberConfig::from_json_file(path)?,
        None => FiberConfig::default(),
    };
    if let Some(v) = cli.stimulus {
        cfg.stimulus = v;
    }
    if let Some(v) = cli.base_model_name {
        cfg.base_model_name = v;
    }
    if let Some(v) = cli.solver {
        cfg.solver = v;
    }
    if !cli.solver_args.is_empty() {
        cfg.solver_args = cli.solver_args;
    }
    if let Some(v) = cli.work_dir {
        cfg.work_dir = v;
    }
    if cli.read_existing {
        cfg.read_existing = true;
    }

    let summary = run_fiber(&cfg, &cli.output)?;

    println!("Fiber batch complete. Runs: {}", summary.runs);
    println!("Run directory: {}", summary.outputs.output_dir.display());
    println!("Static curve: {}", summary.outputs.static_csv.display());
    println!("Summary: {}", summary.outputs.summary_path.display());
    if let Some(fit) = &summary.stiffness {
        println!(
            "Force-displacement slope {:.4} | intercept {:.4} | r {:.3}",
            fit.slope, fit.intercept, fit.r_value
        );
    }

    Ok(())
}
