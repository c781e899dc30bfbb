//! Representative-sample searches over the fitted parameter population:
//! a random-search trace across iteration budgets and a greedy selection
//! on the z-scored population.

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use skinmech::{
    random_search, CovarianceScorer, GreedySampler, ParameterColumn, ParameterTable,
    PopulationMatrix, PropError, RandomSearchResult,
};
use tracing::{debug, info};

/// Best residual reached with a given iteration budget.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TracePoint {
    pub iterations: usize,
    pub residual: f64,
}

/// One greedy pick, tied back to its specimen.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GreedyRow {
    pub step: usize,
    pub row_index: usize,
    pub skin_id: f64,
    pub residual: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SamplingReport {
    pub trace: Vec<TracePoint>,
    pub best: Option<RandomSearchResult>,
    pub greedy: Vec<GreedyRow>,
}

pub fn sampling_population(table: &ParameterTable) -> Result<PopulationMatrix, PropError> {
    table.population_matrix(&ParameterColumn::SAMPLING)
}

/// Random search at each budget, one generator shared across the sweep.
pub fn random_search_trace(
    population: &PopulationMatrix,
    sample_size: usize,
    budgets: &[usize],
    seed: u64,
) -> Result<(Vec<TracePoint>, Option<RandomSearchResult>), PropError> {
    let scorer = CovarianceScorer::new(population);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut trace = Vec::with_capacity(budgets.len());
    let mut best: Option<RandomSearchResult> = None;

    for &iterations in budgets {
        let result = random_search(&scorer, sample_size, iterations, &mut rng)?;
        debug!(iterations, residual = result.residual, "random search budget done");
        trace.push(TracePoint {
            iterations,
            residual: result.residual,
        });
        let improves = best
            .as_ref()
            .map_or(true, |b| result.residual < b.residual);
        if improves {
            best = Some(result);
        }
    }

    Ok((trace, best))
}

/// Greedy selection on the z-scored population.
pub fn greedy_selection(
    table: &ParameterTable,
    population: &PopulationMatrix,
    steps: usize,
) -> Result<Vec<GreedyRow>, PropError> {
    let normalized = population.standardized();
    let sampler = GreedySampler::new(&normalized);
    let history = sampler.select(steps)?;

    Ok(history
        .iter()
        .enumerate()
        .map(|(idx, step)| GreedyRow {
            step: idx + 1,
            row_index: step.added,
            skin_id: table.samples()[step.added].skin_id,
            residual: step.residual,
        })
        .collect())
}

pub fn run_sampling(
    table: &ParameterTable,
    sample_size: usize,
    budgets: &[usize],
    greedy_steps: usize,
    seed: u64,
) -> anyhow::Result<SamplingReport> {
    let population = sampling_population(table).context("sampling population")?;
    let (trace, best) =
        random_search_trace(&population, sample_size, budgets, seed).context("random search")?;
    if let Some(best) = &best {
        info!(
            residual = best.residual,
            sample_size, "best random-search sample"
        );
    }

    let greedy = greedy_selection(table, &population, greedy_steps).context("greedy selection")?;
    info!(
        indices = ?greedy.iter().map(|r| r.row_index).collect::<Vec<_>>(),
        "greedy representative sample"
    );

    Ok(SamplingReport {
        trace,
        best,
        greedy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> ParameterTable {
        let rows: Vec<Vec<f64>> = (0..rows)
            .map(|i| {
                let x = i as f64;
                vec![
                    0.05 + 0.01 * (x * 1.3).sin(),
                    5.0 + (x * 0.7).cos(),
                    0.3 + 0.02 * (x * 2.1).sin(),
                    0.2 + 0.01 * (x * 0.4).cos(),
                    0.5 - 0.02 * (x * 1.7).sin(),
                    0.01 + 0.001 * x,
                    3.0 + 0.3 * (x * 0.9).sin(),
                    0.98,
                    1.2,
                    700.0 + 40.0 * (x * 1.1).cos(),
                    100.0 + x,
                    2.0,
                ]
            })
            .collect();
        ParameterTable::from_rows(&rows).unwrap()
    }

    #[test]
    fn trace_has_one_point_per_budget() {
        let table = table(15);
        let population = sampling_population(&table).unwrap();
        let (trace, best) = random_search_trace(&population, 5, &[10, 100], 3).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[1].iterations, 100);
        let best = best.unwrap();
        let min = trace.iter().map(|p| p.residual).fold(f64::INFINITY, f64::min);
        assert_eq!(best.residual, min);
    }

    #[test]
    fn greedy_rows_map_to_specimen_ids() {
        let table = table(12);
        let population = sampling_population(&table).unwrap();
        let rows = greedy_selection(&table, &population, 4).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].residual.is_none());
        assert!(rows[1..].iter().all(|r| r.residual.is_some()));
        for row in &rows {
            assert_eq!(row.skin_id, 100.0 + row.row_index as f64);
        }
    }

    #[test]
    fn exhausted_greedy_selection_names_the_stage() {
        let table = table(4);
        let err = run_sampling(&table, 3, &[10], 5, 1).unwrap_err();
        assert!(format!("{err:#}").starts_with("greedy selection"));
    }
}
