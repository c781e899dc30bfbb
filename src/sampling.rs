//! Representative sampling by covariance matching
//!
//! Two searches share the [`CovarianceScorer`] objective: an unguided
//! random search over fixed-size samples and a greedy selector that grows
//! a subset one specimen at a time.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::population::{CovarianceScorer, PopulationMatrix};
use crate::PropError;

/// Ordered, duplicate-free row indices selected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIndexSet {
    indices: Vec<usize>,
}

impl SampleIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Copy of `self` with `index` appended.
    fn extended(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.indices.len() + 1);
        indices.extend_from_slice(&self.indices);
        indices.push(index);
        Self { indices }
    }
}

/// Best candidate found by [`random_search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomSearchResult {
    /// Row indices of the winning sample; may contain repeats.
    pub indices: Vec<usize>,
    pub residual: f64,
    pub iterations: usize,
}

/// Draw `iterations` samples of `sample_size` rows and keep the one whose
/// covariance is closest to the population's.
///
/// Rows are drawn uniformly *with replacement*, so a single candidate can
/// hold the same specimen more than once. Ties keep the earliest draw.
pub fn random_search<R: Rng + ?Sized>(
    scorer: &CovarianceScorer<'_>,
    sample_size: usize,
    iterations: usize,
    rng: &mut R,
) -> Result<RandomSearchResult, PropError> {
    if sample_size == 0 {
        return Err(PropError::InvalidRequest(
            "sample_size must be greater than zero".to_string(),
        ));
    }
    if iterations == 0 {
        return Err(PropError::InvalidRequest(
            "iterations must be greater than zero".to_string(),
        ));
    }

    let rows = scorer.population().nrows();
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut candidate = vec![0_usize; sample_size];

    for _ in 0..iterations {
        for slot in candidate.iter_mut() {
            *slot = rng.gen_range(0..rows);
        }
        let residual = scorer.residual(&candidate)?;

        let improves = match &best {
            Some((_, best_residual)) => residual < *best_residual,
            None => true,
        };
        if improves {
            best = Some((candidate.clone(), residual));
        }
    }

    let (indices, residual) = best.ok_or_else(|| {
        PropError::InvalidRequest("random search produced no candidate".to_string())
    })?;
    Ok(RandomSearchResult {
        indices,
        residual,
        iterations,
    })
}

/// Result of one greedy step.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyStep {
    pub selection: SampleIndexSet,
    pub added: usize,
    /// Covariance residual of the extended selection; `None` for the first
    /// (centroid) pick, whose one-row covariance is undefined.
    pub residual: Option<f64>,
}

/// Greedy covariance-matching selector over an already normalized population.
#[derive(Debug, Clone)]
pub struct GreedySampler<'a> {
    scorer: CovarianceScorer<'a>,
}

impl<'a> GreedySampler<'a> {
    /// `population` should be z-scored upstream so wide-range columns do
    /// not dominate distances and covariances.
    pub fn new(population: &'a PopulationMatrix) -> Self {
        Self {
            scorer: CovarianceScorer::new(population),
        }
    }

    pub fn scorer(&self) -> &CovarianceScorer<'a> {
        &self.scorer
    }

    /// Extend `current` by the row that best preserves the population
    /// covariance. An empty selection starts from the row nearest the
    /// centroid.
    pub fn add_sample(&self, current: &SampleIndexSet) -> Result<GreedyStep, PropError> {
        let population = self.scorer.population();
        let rows = population.nrows();
        if let Some(&index) = current.indices().iter().find(|&&i| i >= rows) {
            return Err(PropError::IndexOutOfRange { index, rows });
        }

        if current.is_empty() {
            let added = argmin(population.centroid_distances().into_iter().map(Some))
                .ok_or(PropError::PopulationExhausted)?;
            return Ok(GreedyStep {
                selection: current.extended(added),
                added,
                residual: None,
            });
        }

        let mut scores = Vec::with_capacity(rows);
        let mut candidate = Vec::with_capacity(current.len() + 1);
        for index in 0..rows {
            if current.contains(index) {
                scores.push(None);
                continue;
            }
            candidate.clear();
            candidate.extend_from_slice(current.indices());
            candidate.push(index);
            scores.push(Some(self.scorer.residual(&candidate)?));
        }

        let added = argmin(scores.iter().copied()).ok_or(PropError::PopulationExhausted)?;
        Ok(GreedyStep {
            selection: current.extended(added),
            added,
            residual: scores[added],
        })
    }

    /// Run `steps` greedy steps from an empty selection.
    pub fn select(&self, steps: usize) -> Result<Vec<GreedyStep>, PropError> {
        let mut history: Vec<GreedyStep> = Vec::with_capacity(steps);
        let mut current = SampleIndexSet::new();
        for _ in 0..steps {
            let step = self.add_sample(&current)?;
            current = step.selection.clone();
            history.push(step);
        }
        Ok(history)
    }
}

/// Index of the smallest present score; the first one wins ties.
fn argmin<I: IntoIterator<Item = Option<f64>>>(scores: I) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        let Some(score) = score else {
            continue;
        };
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn population_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (3_usize..10, 1_usize..4).prop_flat_map(|(rows, cols)| {
            proptest::collection::vec(proptest::collection::vec(-1e3_f64..1e3, cols), rows)
        })
    }

    proptest! {
        #[test]
        fn greedy_selects_every_row_once_then_exhausts(rows in population_strategy()) {
            let population = PopulationMatrix::from_rows(&rows).unwrap();
            let sampler = GreedySampler::new(&population);

            let steps = sampler.select(rows.len()).unwrap();
            let last = steps.last().unwrap().selection.clone();
            let mut picked = last.indices().to_vec();
            picked.sort_unstable();
            prop_assert_eq!(picked, (0..rows.len()).collect::<Vec<_>>());
            for (step, history) in steps.iter().enumerate() {
                prop_assert_eq!(history.selection.len(), step + 1);
            }

            prop_assert!(matches!(
                sampler.add_sample(&last),
                Err(PropError::PopulationExhausted)
            ));
        }
    }
}
