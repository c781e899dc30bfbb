use std::path::PathBuf;

use clap::Parser;
use skinmech_simprop::config::AnalysisConfig;
use skinmech_simprop::run_analysis;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Skin property summaries, design tables and representative sampling"
)]
struct Cli {
    /// JSON configuration file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parameter matrix (MAT v4, or header-less CSV)
    #[arg(long)]
    input: Option<PathBuf>,

    /// MAT-file variable holding the parameter matrix
    #[arg(long)]
    variable: Option<String>,

    /// Output base directory
    #[arg(long, default_value = "output-skinmech-simprop")]
    output: PathBuf,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Specimens per random-search sample
    #[arg(long)]
    sample_size: Option<usize>,

    /// Largest random-search budget is 10^max_exponent
    #[arg(long)]
    max_exponent: Option<u32>,

    /// Greedy selection steps
    #[arg(long)]
    greedy_steps: Option<usize>,

    /// Skip PNG output
    #[arg(long)]
    no_plots: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(v) = cli.input {
        cfg.input = v;
    }
    if let Some(v) = cli.variable {
        cfg.variable = v;
    }
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }
    if let Some(v) = cli.sample_size {
        cfg.sample_size = v;
    }
    if let Some(v) = cli.max_exponent {
        cfg.max_exponent = v;
    }
    if let Some(v) = cli.greedy_steps {
        cfg.greedy_steps = v;
    }
    if cli.no_plots {
        cfg.make_plots = false;
    }

    let summary = run_analysis(&cfg, &cli.output)?;

    println!("Analysis complete. Specimens: {}", summary.specimens);
    println!("Run directory: {}", summary.outputs.output_dir.display());
    println!("Design table: {}", summary.outputs.simprop_csv.display());
    println!("Summary: {}", summary.outputs.summary_json.display());
    println!(
        "ginf -> g1: slope {:.4} | intercept {:.4} | r {:.3}",
        summary.ginf_to_g1.slope, summary.ginf_to_g1.intercept, summary.ginf_to_g1.r_value
    );
    if let Some(best) = &summary.best_random_search {
        println!(
            "Best random sample: residual {:.4e} | rows {:?}",
            best.residual,
            best.indices
        );
    }
    println!("Greedy sample rows: {:?}", summary.greedy_indices);

    Ok(())
}
