//! skinmech - viscoelastic skin-property statistics
//!
//! Numeric core shared by the property-summary analyzer and the fiber
//! response driver: fitted-parameter records, five-number summaries,
//! first-degree least-squares fits, population covariance and the
//! covariance-matching representative samplers. [`output`] holds the run
//! directory and CSV helpers both tools write results with.

pub mod output;
pub mod params;
pub mod population;
pub mod regression;
pub mod sampling;
pub mod stats;

use thiserror::Error;

// Re-export main types
pub use params::{ParameterColumn, ParameterSample, ParameterTable};
pub use population::{CovarianceScorer, PopulationMatrix};
pub use regression::LinearFit;
pub use sampling::{random_search, GreedySampler, GreedyStep, RandomSearchResult, SampleIndexSet};
pub use stats::FiveNumberSummary;

#[derive(Debug, Error, PartialEq)]
pub enum PropError {
    #[error("{context}: input is empty")]
    Empty { context: &'static str },
    #[error("{context}: non-finite value at position {index}")]
    NonFinite { context: &'static str, index: usize },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{context}: need at least {required} rows, got {got}")]
    TooFewRows {
        context: &'static str,
        required: usize,
        got: usize,
    },
    #[error("linear fit: x has zero variance")]
    ZeroVariance,
    #[error("no observation lies within the {side} fence")]
    NoObservationWithinFence { side: &'static str },
    #[error("invalid sample request: {0}")]
    InvalidRequest(String),
    #[error("row index {index} out of range for {rows} rows")]
    IndexOutOfRange { index: usize, rows: usize },
    #[error("every row of the population is already selected")]
    PopulationExhausted,
}
