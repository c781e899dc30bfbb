//! First-degree least-squares fits
//!
//! Used to project one fitted parameter from another (e.g. g1 from ginf)
//! and to take residuals about a trend for resampling.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::stats::check_finite;
use crate::PropError;

/// Fitted line `y = slope * x + intercept` with its goodness-of-fit figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of the fitted pairs.
    pub r_value: f64,
    /// Two-sided p-value for a zero-slope null hypothesis; `None` with two points.
    pub p_value: Option<f64>,
    /// Standard error of the slope; `None` with two points.
    pub slope_stderr: Option<f64>,
    pub n: usize,
}

impl LinearFit {
    /// Ordinary least squares on paired samples.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, PropError> {
        if x.len() != y.len() {
            return Err(PropError::LengthMismatch {
                context: "linear fit",
                expected: x.len(),
                got: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(PropError::TooFewRows {
                context: "linear fit",
                required: 2,
                got: x.len(),
            });
        }
        check_finite(x, "linear fit x")?;
        check_finite(y, "linear fit y")?;

        let n = x.len();
        let x_mean = x.iter().sum::<f64>() / n as f64;
        let y_mean = y.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (&xi, &yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        // Rounding leaves sxx ~ n * eps^2 * mean^2 when every x is equal.
        if sxx == 0.0 || sxx <= n as f64 * f64::EPSILON * x_mean * x_mean {
            return Err(PropError::ZeroVariance);
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let r_value = if syy > 0.0 {
            (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let df = n - 2;
        let (p_value, slope_stderr) = if df == 0 {
            (None, None)
        } else {
            let df_f = df as f64;
            let stderr = ((1.0 - r_value * r_value) * syy / sxx / df_f).sqrt();
            (slope_p_value(r_value, df_f), Some(stderr))
        };

        Ok(Self {
            slope,
            intercept,
            r_value,
            p_value,
            slope_stderr,
            n,
        })
    }

    pub fn apply(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn apply_all(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.apply(xi)).collect()
    }

    /// Observed minus predicted.
    pub fn residuals(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>, PropError> {
        if x.len() != y.len() {
            return Err(PropError::LengthMismatch {
                context: "residuals",
                expected: x.len(),
                got: y.len(),
            });
        }
        Ok(x.iter()
            .zip(y)
            .map(|(&xi, &yi)| yi - self.apply(xi))
            .collect())
    }

    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }
}

fn slope_p_value(r: f64, df: f64) -> Option<f64> {
    if r.abs() >= 1.0 {
        return Some(0.0);
    }
    let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}
