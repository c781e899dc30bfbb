//! Skin and substrate material for one fiber model

use std::path::Path;

use anyhow::{bail, Context};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

const FRACTION_TOLERANCE: f64 = 1e-6;

/// Quasi-linear viscoelastic skin on an elastic substrate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialBlock {
    /// Skin thickness [um]
    pub thickness: f64,
    pub g1: f64,
    pub g2: f64,
    pub ginf: f64,
    /// Prony time constants [s]
    pub tau1: f64,
    pub tau2: f64,
    /// Ogden shear modulus
    pub mu: f64,
    /// Ogden exponent
    pub alpha: f64,
    /// Substrate thickness [mm]
    pub sylgard_thickness: f64,
    /// Substrate modulus [Pa]
    pub sylgard_modulus: f64,
}

impl Default for MaterialBlock {
    fn default() -> Self {
        Self {
            thickness: 700.0,
            g1: 0.3,
            g2: 0.2,
            ginf: 0.5,
            tau1: 0.05,
            tau2: 5.0,
            mu: 0.01,
            alpha: 3.0,
            sylgard_thickness: 10.1348,
            sylgard_modulus: 1.05e5,
        }
    }
}

impl MaterialBlock {
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = [
            ("thickness", self.thickness),
            ("tau1", self.tau1),
            ("tau2", self.tau2),
            ("mu", self.mu),
            ("alpha", self.alpha),
            ("sylgard_thickness", self.sylgard_thickness),
            ("sylgard_modulus", self.sylgard_modulus),
        ];
        for (name, value) in positive {
            anyhow::ensure!(value.is_finite() && value > 0.0, "{name} must be finite and > 0");
        }

        for (name, value) in [("g1", self.g1), ("g2", self.g2), ("ginf", self.ginf)] {
            anyhow::ensure!(
                value.is_finite() && (0.0..=1.0).contains(&value),
                "{name} must be in [0, 1], got {value}"
            );
        }
        let total = self.g1 + self.g2 + self.ginf;
        anyhow::ensure!(
            (total - 1.0).abs() <= FRACTION_TOLERANCE,
            "g1 + g2 + ginf must equal 1, got {total}"
        );
        Ok(())
    }

    /// Override with one level of a design table
    /// (`thickness, alpha, sylgardh, sylgarde, g1, g2, ginf`).
    pub fn with_design_level(mut self, row: &[f64; 7]) -> Self {
        self.thickness = row[0];
        self.alpha = row[1];
        self.sylgard_thickness = row[2];
        self.sylgard_modulus = row[3];
        self.g1 = row[4];
        self.g2 = row[5];
        self.ginf = row[6];
        self
    }
}

/// Row `level` of a header-less seven-column design table.
pub fn read_design_level(path: &Path, level: usize) -> anyhow::Result<[f64; 7]> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to open design table {}", path.display()))?;

    let Some(record) = reader.deserialize::<Vec<f64>>().nth(level) else {
        bail!("design table {} has no level {level}", path.display());
    };
    let values = record.with_context(|| format!("bad design level {level}"))?;
    let row: [f64; 7] = values.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "design level {level} has {} columns, expected 7",
            values.len()
        )
    })?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_valid() {
        MaterialBlock::default().validate().unwrap();
    }

    #[test]
    fn fractions_must_sum_to_one() {
        let material = MaterialBlock {
            g2: 0.3,
            ..MaterialBlock::default()
        };
        assert!(material.validate().is_err());
    }

    #[test]
    fn negative_modulus_is_rejected() {
        let material = MaterialBlock {
            mu: -1.0,
            ..MaterialBlock::default()
        };
        assert!(material.validate().is_err());
    }

    #[test]
    fn design_level_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simprop.csv");
        std::fs::write(
            &path,
            "600,2.5,5.0674,5.25e4,0.5,0.4,0.1\n\
             700,3.0,7.6011,7.875e4,0.35,0.3,0.35\n",
        )
        .unwrap();

        let row = read_design_level(&path, 1).unwrap();
        let material = MaterialBlock::default().with_design_level(&row);
        assert_eq!(material.thickness, 700.0);
        assert_eq!(material.sylgard_modulus, 7.875e4);
        assert_eq!(material.ginf, 0.35);
        assert_eq!(material.tau2, MaterialBlock::default().tau2);
        material.validate().unwrap();

        assert!(read_design_level(&path, 2).is_err());
    }
}
