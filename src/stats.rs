//! Descriptive statistics
//!
//! Percentiles use linear interpolation between order statistics
//! (`h = (n - 1) * p`), the same rule as the usual boxplot tooling.

use serde::{Deserialize, Serialize};

use crate::PropError;

/// Boxplot description of one column with data-clamped whiskers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub lower_whisker: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub upper_whisker: f64,
}

impl FiveNumberSummary {
    /// Summarize `data`.
    ///
    /// Whiskers are the most extreme observations within 1.5 IQR of the
    /// quartiles, so they are always actual data values.
    pub fn from_data(data: &[f64]) -> Result<Self, PropError> {
        let sorted = sorted_finite(data, "five-number summary")?;

        let median = percentile_sorted(&sorted, 50.0);
        let lower_quartile = percentile_sorted(&sorted, 25.0);
        let upper_quartile = percentile_sorted(&sorted, 75.0);
        let iqr = upper_quartile - lower_quartile;
        let upper_fence = upper_quartile + 1.5 * iqr;
        let lower_fence = lower_quartile - 1.5 * iqr;

        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= upper_fence)
            .ok_or(PropError::NoObservationWithinFence { side: "upper" })?;
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= lower_fence)
            .ok_or(PropError::NoObservationWithinFence { side: "lower" })?;

        Ok(Self {
            lower_whisker,
            lower_quartile,
            median,
            upper_quartile,
            upper_whisker,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.upper_quartile - self.lower_quartile
    }

    /// Values in ascending order: whisker, quartile, median, quartile, whisker.
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.lower_whisker,
            self.lower_quartile,
            self.median,
            self.upper_quartile,
            self.upper_whisker,
        ]
    }
}

/// Percentile `p` in [0, 100] of `data`.
pub fn percentile(data: &[f64], p: f64) -> Result<f64, PropError> {
    if !(0.0..=100.0).contains(&p) {
        return Err(PropError::InvalidRequest(format!(
            "percentile {p} outside [0, 100]"
        )));
    }
    let sorted = sorted_finite(data, "percentile")?;
    Ok(percentile_sorted(&sorted, p))
}

pub fn median(data: &[f64]) -> Result<f64, PropError> {
    percentile(data, 50.0)
}

pub fn mean(data: &[f64]) -> Result<f64, PropError> {
    check_finite(data, "mean")?;
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Evenly spaced grid of `num` points over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|idx| start + step * idx as f64).collect()
        }
    }
}

pub(crate) fn check_finite(data: &[f64], context: &'static str) -> Result<(), PropError> {
    if data.is_empty() {
        return Err(PropError::Empty { context });
    }
    match data.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PropError::NonFinite { context, index }),
        None => Ok(()),
    }
}

fn sorted_finite(data: &[f64], context: &'static str) -> Result<Vec<f64>, PropError> {
    check_finite(data, context)?;
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(sorted)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p / 100.0;
    let lower = h.floor() as usize;
    if lower >= n - 1 {
        return sorted[n - 1];
    }
    let frac = h - lower as f64;
    sorted[lower] + frac * (sorted[lower + 1] - sorted[lower])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_to_ten_matches_reference_values() {
        let data: Vec<f64> = (1..=10).map(f64::from).collect();
        let summary = FiveNumberSummary::from_data(&data).unwrap();

        assert_relative_eq!(summary.median, 5.5);
        assert_relative_eq!(summary.lower_quartile, 3.25);
        assert_relative_eq!(summary.upper_quartile, 7.75);
        assert_relative_eq!(summary.iqr(), 4.5);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 10.0);
    }

    #[test]
    fn whiskers_clamp_to_observations_inside_fences() {
        // Q1 = 1.5, Q3 = 4.5, fences [-3.0, 9.0]
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0, -50.0];
        let summary = FiveNumberSummary::from_data(&data).unwrap();
        assert_eq!(summary.upper_whisker, 5.0);
        assert_eq!(summary.lower_whisker, 1.0);
    }

    #[test]
    fn summary_is_non_decreasing() {
        let data = [0.3, -2.0, 7.5, 7.5, 1.1, 0.0, 12.0, -40.0, 3.3];
        let values = FiveNumberSummary::from_data(&data).unwrap().to_array();
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn constant_data_collapses_to_single_value() {
        let summary = FiveNumberSummary::from_data(&[4.2; 6]).unwrap();
        assert!(summary.to_array().iter().all(|&v| v == 4.2));
    }

    #[test]
    fn single_value_is_its_own_summary() {
        let summary = FiveNumberSummary::from_data(&[3.0]).unwrap();
        assert_eq!(summary.to_array(), [3.0; 5]);
    }

    #[test]
    fn empty_and_nan_inputs_fail() {
        assert_eq!(
            FiveNumberSummary::from_data(&[]),
            Err(PropError::Empty {
                context: "five-number summary"
            })
        );
        assert!(matches!(
            FiveNumberSummary::from_data(&[1.0, f64::NAN]),
            Err(PropError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let data = [10.0, 0.0, 20.0, 30.0];
        assert_relative_eq!(percentile(&data, 50.0).unwrap(), 15.0);
        assert_relative_eq!(percentile(&data, 0.0).unwrap(), 0.0);
        assert_relative_eq!(percentile(&data, 100.0).unwrap(), 30.0);
        assert!(percentile(&data, 101.0).is_err());
    }

    #[test]
    fn linspace_includes_both_ends() {
        let grid = linspace(0.5, 1.5, 5);
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid[0], 0.5);
        assert_relative_eq!(grid[2], 1.0);
        assert_relative_eq!(grid[4], 1.5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn summary_is_ordered_and_whiskers_are_observed(
            data in proptest::collection::vec(-1e6_f64..1e6, 1..60)
        ) {
            let summary = FiveNumberSummary::from_data(&data).unwrap();
            let values = summary.to_array();
            prop_assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
            prop_assert!(data.contains(&summary.lower_whisker));
            prop_assert!(data.contains(&summary.upper_whisker));
        }
    }
}
