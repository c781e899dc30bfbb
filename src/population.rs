//! Population matrix and covariance residual
//!
//! Rows are specimens, columns are parameter dimensions. Covariances use
//! the unbiased (N - 1) normalization throughout so that population and
//! subset matrices are directly comparable.

use nalgebra::DMatrix;

use crate::PropError;

/// Specimens-by-parameters table with at least two rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationMatrix {
    data: DMatrix<f64>,
}

impl PopulationMatrix {
    pub fn new(data: DMatrix<f64>) -> Result<Self, PropError> {
        if data.nrows() < 2 {
            return Err(PropError::TooFewRows {
                context: "population",
                required: 2,
                got: data.nrows(),
            });
        }
        if data.ncols() == 0 {
            return Err(PropError::Empty {
                context: "population columns",
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(PropError::NonFinite {
                context: "population",
                index,
            });
        }
        Ok(Self { data })
    }

    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, PropError> {
        let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(rows.len() * ncols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(PropError::LengthMismatch {
                    context: "population row",
                    expected: ncols,
                    got: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::new(DMatrix::from_row_slice(rows.len(), ncols, &flat))
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn row(&self, index: usize) -> Vec<f64> {
        self.data.row(index).iter().copied().collect()
    }

    pub fn column_means(&self) -> Vec<f64> {
        column_means(&self.data)
    }

    /// Unbiased covariance of the whole population.
    pub fn covariance(&self) -> DMatrix<f64> {
        unbiased_covariance(&self.data)
    }

    /// Unbiased covariance of the rows named by `indices` (repeats allowed).
    pub fn subset_covariance(&self, indices: &[usize]) -> Result<DMatrix<f64>, PropError> {
        let subset = self.select_rows(indices)?;
        if subset.nrows() < 2 {
            return Err(PropError::TooFewRows {
                context: "subset covariance",
                required: 2,
                got: subset.nrows(),
            });
        }
        Ok(unbiased_covariance(&subset))
    }

    pub fn select_rows(&self, indices: &[usize]) -> Result<DMatrix<f64>, PropError> {
        let rows = self.nrows();
        if let Some(&index) = indices.iter().find(|&&i| i >= rows) {
            return Err(PropError::IndexOutOfRange { index, rows });
        }
        Ok(self.data.select_rows(indices.iter()))
    }

    /// Z-score every column with the population (ddof 0) standard deviation.
    ///
    /// Constant columns are centred but left unscaled.
    pub fn standardized(&self) -> Self {
        let means = self.column_means();
        let n = self.nrows() as f64;
        let stds: Vec<f64> = (0..self.ncols())
            .map(|j| {
                let var = self
                    .data
                    .column(j)
                    .iter()
                    .map(|v| (v - means[j]).powi(2))
                    .sum::<f64>()
                    / n;
                var.sqrt()
            })
            .collect();

        let data = DMatrix::from_fn(self.nrows(), self.ncols(), |i, j| {
            let centred = self.data[(i, j)] - means[j];
            if stds[j] > 0.0 {
                centred / stds[j]
            } else {
                centred
            }
        });
        Self { data }
    }

    /// Squared distance of each row to the column-wise mean.
    pub fn centroid_distances(&self) -> Vec<f64> {
        let means = self.column_means();
        self.data
            .row_iter()
            .map(|row| {
                row.iter()
                    .zip(&means)
                    .map(|(v, m)| (v - m).powi(2))
                    .sum::<f64>()
            })
            .collect()
    }
}

/// Scores candidate subsets against a cached population covariance.
#[derive(Debug, Clone)]
pub struct CovarianceScorer<'a> {
    population: &'a PopulationMatrix,
    population_cov: DMatrix<f64>,
}

impl<'a> CovarianceScorer<'a> {
    pub fn new(population: &'a PopulationMatrix) -> Self {
        Self {
            population,
            population_cov: population.covariance(),
        }
    }

    pub fn population(&self) -> &PopulationMatrix {
        self.population
    }

    pub fn population_covariance(&self) -> &DMatrix<f64> {
        &self.population_cov
    }

    /// Sum of squared elementwise differences between the population
    /// covariance and the covariance of the rows in `indices`.
    pub fn residual(&self, indices: &[usize]) -> Result<f64, PropError> {
        let sample_cov = self.population.subset_covariance(indices)?;
        Ok(covariance_residual(&self.population_cov, &sample_cov))
    }
}

pub fn covariance_residual(population_cov: &DMatrix<f64>, sample_cov: &DMatrix<f64>) -> f64 {
    (population_cov - sample_cov).map(|d| d * d).sum()
}

fn column_means(data: &DMatrix<f64>) -> Vec<f64> {
    let n = data.nrows() as f64;
    data.column_iter().map(|col| col.sum() / n).collect()
}

fn unbiased_covariance(data: &DMatrix<f64>) -> DMatrix<f64> {
    let means = column_means(data);
    let centred = DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| data[(i, j)] - means[j]);
    (centred.transpose() * &centred) / (data.nrows() as f64 - 1.0)
}
