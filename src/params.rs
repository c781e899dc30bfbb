//! Fitted viscoelastic parameters
//!
//! One record per skin specimen, as produced by the quasi-linear
//! viscoelastic fits (two-term Prony series plus equilibrium fraction).

use serde::{Deserialize, Serialize};

use crate::population::PopulationMatrix;
use crate::PropError;

/// Column of the fitted-parameter matrix, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterColumn {
    Tau1,
    Tau2,
    G1,
    G2,
    Ginf,
    Mu,
    Alpha,
    R2,
    Stretch,
    Thickness,
    SkinId,
    RampTime,
}

impl ParameterColumn {
    pub const ALL: [ParameterColumn; 12] = [
        ParameterColumn::Tau1,
        ParameterColumn::Tau2,
        ParameterColumn::G1,
        ParameterColumn::G2,
        ParameterColumn::Ginf,
        ParameterColumn::Mu,
        ParameterColumn::Alpha,
        ParameterColumn::R2,
        ParameterColumn::Stretch,
        ParameterColumn::Thickness,
        ParameterColumn::SkinId,
        ParameterColumn::RampTime,
    ];

    /// Columns used for representative sampling.
    pub const SAMPLING: [ParameterColumn; 8] = [
        ParameterColumn::Tau1,
        ParameterColumn::Tau2,
        ParameterColumn::G1,
        ParameterColumn::G2,
        ParameterColumn::Ginf,
        ParameterColumn::Mu,
        ParameterColumn::Alpha,
        ParameterColumn::Thickness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterColumn::Tau1 => "tau1",
            ParameterColumn::Tau2 => "tau2",
            ParameterColumn::G1 => "g1",
            ParameterColumn::G2 => "g2",
            ParameterColumn::Ginf => "ginf",
            ParameterColumn::Mu => "mu",
            ParameterColumn::Alpha => "alpha",
            ParameterColumn::R2 => "r2",
            ParameterColumn::Stretch => "stretch",
            ParameterColumn::Thickness => "thickness",
            ParameterColumn::SkinId => "skin_id",
            ParameterColumn::RampTime => "ramp_time",
        }
    }
}

/// Fitted parameters of one specimen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSample {
    /// First relaxation time [s]
    pub tau1: f64,
    /// Second relaxation time [s]
    pub tau2: f64,
    /// First relaxation-strength fraction
    pub g1: f64,
    /// Second relaxation-strength fraction
    pub g2: f64,
    /// Equilibrium-strength fraction
    pub ginf: f64,
    /// Friction-like parameter
    pub mu: f64,
    /// Power-law exponent
    pub alpha: f64,
    /// Goodness of fit
    pub r2: f64,
    pub stretch: f64,
    pub thickness: f64,
    pub skin_id: f64,
    /// Ramp time of the relaxation test [s]
    pub ramp_time: f64,
}

impl ParameterSample {
    pub const WIDTH: usize = 12;

    /// Build a record from one matrix row in [`ParameterColumn::ALL`] order.
    pub fn from_row(row: &[f64]) -> Result<Self, PropError> {
        if row.len() != Self::WIDTH {
            return Err(PropError::LengthMismatch {
                context: "parameter row",
                expected: Self::WIDTH,
                got: row.len(),
            });
        }
        if let Some(index) = row.iter().position(|v| !v.is_finite()) {
            return Err(PropError::NonFinite {
                context: "parameter row",
                index,
            });
        }

        Ok(Self {
            tau1: row[0],
            tau2: row[1],
            g1: row[2],
            g2: row[3],
            ginf: row[4],
            mu: row[5],
            alpha: row[6],
            r2: row[7],
            stretch: row[8],
            thickness: row[9],
            skin_id: row[10],
            ramp_time: row[11],
        })
    }

    pub fn get(&self, column: ParameterColumn) -> f64 {
        match column {
            ParameterColumn::Tau1 => self.tau1,
            ParameterColumn::Tau2 => self.tau2,
            ParameterColumn::G1 => self.g1,
            ParameterColumn::G2 => self.g2,
            ParameterColumn::Ginf => self.ginf,
            ParameterColumn::Mu => self.mu,
            ParameterColumn::Alpha => self.alpha,
            ParameterColumn::R2 => self.r2,
            ParameterColumn::Stretch => self.stretch,
            ParameterColumn::Thickness => self.thickness,
            ParameterColumn::SkinId => self.skin_id,
            ParameterColumn::RampTime => self.ramp_time,
        }
    }
}

/// All specimens of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    samples: Vec<ParameterSample>,
}

impl ParameterTable {
    pub fn new(samples: Vec<ParameterSample>) -> Result<Self, PropError> {
        if samples.is_empty() {
            return Err(PropError::Empty {
                context: "parameter table",
            });
        }
        Ok(Self { samples })
    }

    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, PropError> {
        let samples = rows
            .iter()
            .map(|row| ParameterSample::from_row(row.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(samples)
    }

    pub fn samples(&self) -> &[ParameterSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn column(&self, column: ParameterColumn) -> Vec<f64> {
        self.samples.iter().map(|s| s.get(column)).collect()
    }

    /// Multiply thickness by `factor` (unit change, e.g. mm to um).
    pub fn scale_thickness(&mut self, factor: f64) {
        for sample in &mut self.samples {
            sample.thickness *= factor;
        }
    }

    pub fn population_matrix(
        &self,
        columns: &[ParameterColumn],
    ) -> Result<PopulationMatrix, PropError> {
        let rows: Vec<Vec<f64>> = self
            .samples
            .iter()
            .map(|s| columns.iter().map(|&c| s.get(c)).collect())
            .collect();
        PopulationMatrix::from_rows(&rows)
    }
}
