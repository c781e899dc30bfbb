//! Fiber model: one solver job per stimulus row, with the static
//! force-displacement curve taken from the final sample of each run.

use serde::Serialize;
use tracing::info;

use crate::material::MaterialBlock;
use crate::simulator::{Simulator, StaticPoint, TimeSeries};
use crate::stimulus::StimulusRow;

/// Everything a solver needs for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub index: usize,
    pub job_name: String,
    pub stimulus: StimulusRow,
    pub material: MaterialBlock,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run: RunConfig,
    pub series: TimeSeries,
}

/// One fiber model per stimulus row, sharing a material.
#[derive(Debug, Clone)]
pub struct FiberModel {
    pub base_model_name: String,
    pub suffix: String,
    pub runs: Vec<RunConfig>,
}

impl FiberModel {
    pub fn new(
        base_model_name: &str,
        suffix: &str,
        stimuli: &[StimulusRow],
        material: MaterialBlock,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!base_model_name.is_empty(), "base model name must not be empty");
        anyhow::ensure!(!stimuli.is_empty(), "at least one stimulus row is required");
        material.validate()?;
        for row in stimuli {
            row.validate()?;
        }

        let runs = stimuli
            .iter()
            .enumerate()
            .map(|(index, &stimulus)| RunConfig {
                index,
                job_name: format!("{base_model_name}{suffix}Run{index}"),
                stimulus,
                material,
            })
            .collect();

        Ok(Self {
            base_model_name: base_model_name.to_string(),
            suffix: suffix.to_string(),
            runs,
        })
    }

    /// Run every job in stimulus order; the first failure stops the batch.
    pub fn run<S: Simulator + ?Sized>(&self, simulator: &mut S) -> anyhow::Result<Vec<RunOutput>> {
        let mut outputs = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            let series = simulator.run(run)?;
            let point = series.static_point();
            info!(
                job = %run.job_name,
                samples = series.len(),
                displ = point.displ,
                force = point.force,
                "run finished"
            );
            outputs.push(RunOutput {
                run: run.clone(),
                series,
            });
        }
        Ok(outputs)
    }
}

pub fn static_curve(outputs: &[RunOutput]) -> Vec<StaticPoint> {
    outputs.iter().map(|o| o.series.static_point()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LinearSkin {
        stiffness: f64,
        calls: usize,
    }

    impl Simulator for LinearSkin {
        fn run(&mut self, run: &RunConfig) -> anyhow::Result<TimeSeries> {
            self.calls += 1;
            let d = run.stimulus.displacement;
            TimeSeries::from_rows(&[
                [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                [run.stimulus.total_time(), self.stiffness * d, d, 1.0, 0.1, 0.01],
            ])
        }
    }

    struct Failing;

    impl Simulator for Failing {
        fn run(&mut self, run: &RunConfig) -> anyhow::Result<TimeSeries> {
            anyhow::bail!("no license for {}", run.job_name)
        }
    }

    fn stimuli() -> Vec<StimulusRow> {
        [0.2, 0.4, 0.6]
            .iter()
            .map(|&displacement| StimulusRow {
                displacement,
                ramp_time: 0.5,
                hold_time: 5.0,
            })
            .collect()
    }

    #[test]
    fn job_names_follow_base_suffix_index() {
        let model = FiberModel::new("Skin", "Thick", &stimuli(), MaterialBlock::default()).unwrap();
        let names: Vec<&str> = model.runs.iter().map(|r| r.job_name.as_str()).collect();
        assert_eq!(names, vec!["SkinThickRun0", "SkinThickRun1", "SkinThickRun2"]);
    }

    #[test]
    fn static_curve_uses_final_samples_in_order() {
        let model = FiberModel::new("Skin", "", &stimuli(), MaterialBlock::default()).unwrap();
        let mut sim = LinearSkin {
            stiffness: 2.0,
            calls: 0,
        };
        let outputs = model.run(&mut sim).unwrap();
        assert_eq!(sim.calls, 3);

        let curve = static_curve(&outputs);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[2], StaticPoint { displ: 0.6, force: 1.2 });
    }

    #[test]
    fn invalid_material_is_rejected_up_front() {
        let material = MaterialBlock {
            ginf: 0.9,
            ..MaterialBlock::default()
        };
        assert!(FiberModel::new("Skin", "", &stimuli(), material).is_err());
        assert!(FiberModel::new("Skin", "", &[], MaterialBlock::default()).is_err());
    }

    #[test]
    fn solver_failure_stops_the_batch() {
        let model = FiberModel::new("Skin", "", &stimuli(), MaterialBlock::default()).unwrap();
        let err = model.run(&mut Failing).unwrap_err();
        assert!(err.to_string().contains("SkinRun0"));
    }
}
