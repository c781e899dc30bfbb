use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Runtime configuration for the property-summary analysis.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Parameter matrix: MAT-file (level 5 or 4), or header-less CSV by extension
    #[serde_as(as = "DefaultOnNull")]
    pub input: PathBuf,
    /// Variable holding the 12-column matrix inside a MAT-file
    #[serde_as(as = "DefaultOnNull")]
    pub variable: String,
    /// Factor applied to thickness after loading (mm to um)
    #[serde_as(as = "DefaultOnNull")]
    pub thickness_scale: f64,
    /// Design value replacing the observed ginf lower whisker
    #[serde_as(as = "DefaultOnNull")]
    pub ginf_floor: f64,
    /// Substrate (Sylgard) base thickness [mm]
    #[serde_as(as = "DefaultOnNull")]
    pub sylgard_thickness: f64,
    /// Substrate (Sylgard) base modulus [Pa]
    #[serde_as(as = "DefaultOnNull")]
    pub sylgard_modulus: f64,
    /// Lower end of the substrate scale grid
    #[serde_as(as = "DefaultOnNull")]
    pub substrate_scale_min: f64,
    /// Upper end of the substrate scale grid
    #[serde_as(as = "DefaultOnNull")]
    pub substrate_scale_max: f64,
    /// Specimens per representative sample
    #[serde_as(as = "DefaultOnNull")]
    pub sample_size: usize,
    /// Random search runs 10^1 ..= 10^max_exponent iterations
    #[serde_as(as = "DefaultOnNull")]
    pub max_exponent: u32,
    /// Number of greedy selection steps
    #[serde_as(as = "DefaultOnNull")]
    pub greedy_steps: usize,
    /// RNG seed for the random search
    #[serde_as(as = "DefaultOnNull")]
    pub seed: u64,
    #[serde_as(as = "DefaultOnNull")]
    pub make_plots: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("strain_level_2py.mat"),
            variable: "qlv2tFixPara".to_string(),
            thickness_scale: 1e3,
            ginf_floor: 0.1,
            sylgard_thickness: 10.1348,
            sylgard_modulus: 1.05e5,
            substrate_scale_min: 0.5,
            substrate_scale_max: 1.5,
            sample_size: 10,
            max_exponent: 6,
            greedy_steps: 8,
            seed: 2014,
            make_plots: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg: AnalysisConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON config: {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.variable.is_empty(),
            "variable name must not be empty"
        );
        anyhow::ensure!(
            self.thickness_scale.is_finite() && self.thickness_scale > 0.0,
            "thickness_scale must be finite and > 0"
        );
        anyhow::ensure!(
            self.ginf_floor.is_finite() && (0.0..=1.0).contains(&self.ginf_floor),
            "ginf_floor must be in [0, 1]"
        );
        anyhow::ensure!(
            self.sylgard_thickness > 0.0 && self.sylgard_modulus > 0.0,
            "sylgard_thickness and sylgard_modulus must be > 0"
        );
        anyhow::ensure!(
            self.substrate_scale_min > 0.0 && self.substrate_scale_max >= self.substrate_scale_min,
            "substrate scale grid must satisfy 0 < min <= max"
        );
        anyhow::ensure!(self.sample_size >= 2, "sample_size must be at least 2");
        anyhow::ensure!(
            (1..=9).contains(&self.max_exponent),
            "max_exponent must be in 1..=9"
        );
        Ok(())
    }

    /// Iteration budgets of the random-search trace.
    pub fn iteration_budgets(&self) -> Vec<usize> {
        (1..=self.max_exponent).map(|e| 10_usize.pow(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AnalysisConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.iteration_budgets(), vec![10, 100, 1_000, 10_000, 100_000, 1_000_000]);
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"sample_size": null, "greedy_steps": 3}"#).unwrap();
        assert_eq!(cfg.sample_size, 10);
        assert_eq!(cfg.greedy_steps, 3);
        assert_eq!(cfg.variable, "qlv2tFixPara");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cfg = AnalysisConfig {
            sample_size: 1,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = AnalysisConfig {
            ginf_floor: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
