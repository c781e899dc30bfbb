use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use crate::material::MaterialBlock;

/// Runtime configuration for a batch of fiber simulations.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiberConfig {
    /// Headed stimulus CSV, one run per row
    #[serde_as(as = "DefaultOnNull")]
    pub stimulus: PathBuf,
    #[serde_as(as = "DefaultOnNull")]
    pub base_model_name: String,
    /// Appended to the base name in job names
    #[serde_as(as = "DefaultOnNull")]
    pub suffix: String,
    /// Solver executable
    #[serde_as(as = "DefaultOnNull")]
    pub solver: String,
    /// Arguments placed before the job file
    #[serde_as(as = "DefaultOnNull")]
    pub solver_args: Vec<String>,
    /// Directory holding job files and solver results
    #[serde_as(as = "DefaultOnNull")]
    pub work_dir: PathBuf,
    /// Reuse results in `work_dir` instead of invoking the solver
    #[serde_as(as = "DefaultOnNull")]
    pub read_existing: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub material: MaterialBlock,
    /// Optional header-less design table overriding the material
    pub design_table: Option<PathBuf>,
    /// Row of `design_table` to use
    #[serde_as(as = "DefaultOnNull")]
    pub design_level: usize,
    #[serde_as(as = "DefaultOnNull")]
    pub make_plots: bool,
}

impl Default for FiberConfig {
    fn default() -> Self {
        Self {
            stimulus: PathBuf::from("stim.csv"),
            base_model_name: "Fiber".to_string(),
            suffix: String::new(),
            solver: "fiber-solver".to_string(),
            solver_args: Vec::new(),
            work_dir: PathBuf::from("fiber-work"),
            read_existing: false,
            material: MaterialBlock::default(),
            design_table: None,
            design_level: 2,
            make_plots: true,
        }
    }
}

impl FiberConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg: FiberConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON config: {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.base_model_name.is_empty(),
            "base_model_name must not be empty"
        );
        anyhow::ensure!(
            self.read_existing || !self.solver.is_empty(),
            "solver must be set unless read_existing is enabled"
        );
        anyhow::ensure!(self.design_level < 5, "design_level must be in 0..5");
        self.material.validate()
    }
}
