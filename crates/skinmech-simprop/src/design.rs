//! Design tables for follow-on simulations
//!
//! Parameter combinations are not observed directly: they are the
//! five-number summaries of the measured population, with the relaxation
//! fractions projected from linear trends so that g1 + g2 + ginf = 1.

use serde::Serialize;
use skinmech::stats::{linspace, median};
use skinmech::{FiveNumberSummary, LinearFit, ParameterColumn, ParameterTable, PropError};

use crate::config::AnalysisConfig;

/// Summaries of the properties that drive the design.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PropertySummaries {
    pub thickness: FiveNumberSummary,
    pub alpha: FiveNumberSummary,
    pub ginf: FiveNumberSummary,
}

impl PropertySummaries {
    pub fn from_table(table: &ParameterTable) -> Result<Self, PropError> {
        Ok(Self {
            thickness: FiveNumberSummary::from_data(&table.column(ParameterColumn::Thickness))?,
            alpha: FiveNumberSummary::from_data(&table.column(ParameterColumn::Alpha))?,
            ginf: FiveNumberSummary::from_data(&table.column(ParameterColumn::Ginf))?,
        })
    }
}

/// Five design levels per property (lower whisker to upper whisker).
#[derive(Debug, Clone, Serialize)]
pub struct DesignProperties {
    pub thickness: [f64; 5],
    pub alpha: [f64; 5],
    pub sylgardh: [f64; 5],
    pub sylgarde: [f64; 5],
    pub g1: [f64; 5],
    pub g2: [f64; 5],
    pub ginf: [f64; 5],
    /// Observed ginf lower whisker before the floor was applied.
    pub observed_ginf_min: f64,
    pub ginf_to_g1: LinearFit,
}

impl DesignProperties {
    /// Columns in the order of the exported design table.
    pub fn columns(&self) -> [(&'static str, [f64; 5]); 7] {
        [
            ("thickness", self.thickness),
            ("alpha", self.alpha),
            ("sylgardh", self.sylgardh),
            ("sylgarde", self.sylgarde),
            ("g1", self.g1),
            ("g2", self.g2),
            ("ginf", self.ginf),
        ]
    }
}

pub fn design_properties(
    table: &ParameterTable,
    summaries: &PropertySummaries,
    cfg: &AnalysisConfig,
) -> Result<DesignProperties, PropError> {
    let observed_ginf_min = summaries.ginf.lower_whisker;
    let mut ginf = summaries.ginf.to_array();
    ginf[0] = cfg.ginf_floor;

    let ginf_to_g1 = LinearFit::fit(
        &table.column(ParameterColumn::Ginf),
        &table.column(ParameterColumn::G1),
    )?;
    let g1 = ginf.map(|v| ginf_to_g1.apply(v));
    let g2 = complement(&g1, &ginf);

    let grid = linspace(cfg.substrate_scale_min, cfg.substrate_scale_max, 5);
    let sylgardh = five(grid.iter().map(|s| cfg.sylgard_thickness * s));
    let sylgarde = five(grid.iter().map(|s| cfg.sylgard_modulus * s));

    Ok(DesignProperties {
        thickness: summaries.thickness.to_array(),
        alpha: summaries.alpha.to_array(),
        sylgardh,
        sylgarde,
        g1,
        g2,
        ginf,
        observed_ginf_min,
        ginf_to_g1,
    })
}

/// Relaxation fractions for one relaxation-adaptation design.
#[derive(Debug, Clone, Serialize)]
pub struct RelaxationDesign {
    pub g1: [f64; 5],
    pub g2: [f64; 5],
    pub ginf: [f64; 5],
}

impl RelaxationDesign {
    fn from_ginf(ginf: [f64; 5], ginf_to_g1: &LinearFit) -> Self {
        let g1 = ginf.map(|v| ginf_to_g1.apply(v));
        let g2 = complement(&g1, &ginf);
        Self { g1, g2, ginf }
    }
}

/// Thickness-driven and individual-difference relaxation designs.
#[derive(Debug, Clone, Serialize)]
pub struct RelaxationDesigns {
    pub thickness_to_ginf: LinearFit,
    pub thickness_to_g1: LinearFit,
    pub by_thickness: RelaxationDesign,
    pub ginf_residuals: FiveNumberSummary,
    pub individual: RelaxationDesign,
}

pub fn relaxation_designs(
    table: &ParameterTable,
    thickness_levels: &[f64; 5],
    ginf_to_g1: &LinearFit,
) -> Result<RelaxationDesigns, PropError> {
    let thickness = table.column(ParameterColumn::Thickness);
    let ginf = table.column(ParameterColumn::Ginf);
    let g1 = table.column(ParameterColumn::G1);

    // Trends with thickness, each fraction fitted on its own.
    let thickness_to_ginf = LinearFit::fit(&thickness, &ginf)?;
    let thickness_to_g1 = LinearFit::fit(&thickness, &g1)?;
    let by_ginf = thickness_levels.map(|t| thickness_to_ginf.apply(t));
    let by_g1 = thickness_levels.map(|t| thickness_to_g1.apply(t));
    let by_thickness = RelaxationDesign {
        g1: by_g1,
        g2: complement(&by_g1, &by_ginf),
        ginf: by_ginf,
    };

    // Spread about the thickness trend, re-centred on the median.
    let residuals = thickness_to_ginf.residuals(&thickness, &ginf)?;
    let ginf_residuals = FiveNumberSummary::from_data(&residuals)?;
    let ginf_median = median(&ginf)?;
    let individual =
        RelaxationDesign::from_ginf(ginf_residuals.to_array().map(|r| ginf_median + r), ginf_to_g1);

    Ok(RelaxationDesigns {
        thickness_to_ginf,
        thickness_to_g1,
        by_thickness,
        ginf_residuals,
        individual,
    })
}

fn complement(g1: &[f64; 5], ginf: &[f64; 5]) -> [f64; 5] {
    let mut g2 = [0.0; 5];
    for idx in 0..5 {
        g2[idx] = 1.0 - g1[idx] - ginf[idx];
    }
    g2
}

fn five<I: Iterator<Item = f64>>(values: I) -> [f64; 5] {
    let mut out = [0.0; 5];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// g1 = 0.8 - ginf exactly; thickness rises with ginf.
    fn table() -> ParameterTable {
        let rows: Vec<Vec<f64>> = (0..9)
            .map(|i| {
                let ginf = 0.2 + 0.05 * i as f64;
                let g1 = 0.8 - ginf;
                let thickness = 0.5 + 0.1 * i as f64 + if i % 2 == 0 { 0.02 } else { -0.02 };
                vec![
                    0.05, 5.0, g1, 1.0 - g1 - ginf, ginf, 0.01, 3.0 + 0.1 * i as f64, 0.98,
                    1.2, thickness, i as f64, 2.0,
                ]
            })
            .collect();
        ParameterTable::from_rows(&rows).unwrap()
    }

    #[test]
    fn design_fractions_sum_to_one() {
        let table = table();
        let summaries = PropertySummaries::from_table(&table).unwrap();
        let design = design_properties(&table, &summaries, &AnalysisConfig::default()).unwrap();

        assert_eq!(design.ginf[0], 0.1);
        assert_relative_eq!(design.observed_ginf_min, 0.2, epsilon = 1e-12);
        for idx in 0..5 {
            assert_relative_eq!(
                design.g1[idx] + design.g2[idx] + design.ginf[idx],
                1.0,
                epsilon = 1e-12
            );
            assert_relative_eq!(design.g1[idx], 0.8 - design.ginf[idx], epsilon = 1e-10);
        }
    }

    #[test]
    fn substrate_levels_span_half_to_one_and_a_half() {
        let table = table();
        let summaries = PropertySummaries::from_table(&table).unwrap();
        let design = design_properties(&table, &summaries, &AnalysisConfig::default()).unwrap();

        assert_relative_eq!(design.sylgardh[0], 10.1348 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(design.sylgardh[4], 10.1348 * 1.5, epsilon = 1e-12);
        assert_relative_eq!(design.sylgarde[2], 1.05e5, epsilon = 1e-6);
    }

    #[test]
    fn relaxation_designs_follow_trends() {
        let table = table();
        let summaries = PropertySummaries::from_table(&table).unwrap();
        let design = design_properties(&table, &summaries, &AnalysisConfig::default()).unwrap();
        let designs = relaxation_designs(&table, &design.thickness, &design.ginf_to_g1).unwrap();

        assert!(designs.thickness_to_ginf.slope > 0.0);
        for idx in 0..5 {
            let d = &designs.by_thickness;
            assert_relative_eq!(d.g1[idx] + d.g2[idx] + d.ginf[idx], 1.0, epsilon = 1e-12);
            let d = &designs.individual;
            assert_relative_eq!(d.g1[idx] + d.g2[idx] + d.ginf[idx], 1.0, epsilon = 1e-12);
        }
        // Individual design is centred on the median ginf.
        let centre = designs.individual.ginf[2] - designs.ginf_residuals.median;
        assert_relative_eq!(centre, 0.4, epsilon = 1e-12);
    }
}
