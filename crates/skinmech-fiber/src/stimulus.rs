//! Stimulus table of ramp-and-hold indentation runs.

use std::path::Path;

use anyhow::{bail, Context};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// One indentation run: ramp to `displacement`, then hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusRow {
    /// Target indentation depth [mm]
    pub displacement: f64,
    /// Ramp duration [s]
    pub ramp_time: f64,
    /// Hold duration [s]
    pub hold_time: f64,
}

impl StimulusRow {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.displacement.is_finite(),
            "displacement must be finite"
        );
        anyhow::ensure!(
            self.ramp_time.is_finite() && self.ramp_time > 0.0,
            "ramp_time must be finite and > 0"
        );
        anyhow::ensure!(
            self.hold_time.is_finite() && self.hold_time > 0.0,
            "hold_time must be finite and > 0"
        );
        Ok(())
    }

    pub fn total_time(&self) -> f64 {
        self.ramp_time + self.hold_time
    }
}

/// Headed CSV with `displacement`, `ramp_time` and `hold_time` columns.
pub fn read_stimulus_csv(path: &Path) -> anyhow::Result<Vec<StimulusRow>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open stimulus table {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<StimulusRow>().enumerate() {
        let row = record
            .with_context(|| format!("bad stimulus row {} in {}", idx + 1, path.display()))?;
        row.validate()
            .with_context(|| format!("invalid stimulus row {}", idx + 1))?;
        rows.push(row);
    }

    if rows.is_empty() {
        bail!("stimulus table {} has no rows", path.display());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headed_rows_in_any_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stim.csv");
        std::fs::write(
            &path,
            "hold_time, displacement, ramp_time\n5, 0.3, 0.5\n5, 0.6, 0.5\n",
        )
        .unwrap();

        let rows = read_stimulus_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].displacement, 0.6);
        assert_eq!(rows[0].total_time(), 5.5);
    }

    #[test]
    fn zero_ramp_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stim.csv");
        std::fs::write(&path, "displacement,ramp_time,hold_time\n0.3,0,5\n").unwrap();
        assert!(read_stimulus_csv(&path).is_err());
    }

    #[test]
    fn header_only_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stim.csv");
        std::fs::write(&path, "displacement,ramp_time,hold_time\n").unwrap();
        assert!(read_stimulus_csv(&path).is_err());
    }
}
