use crate::difeq::DifEq;
use crate::difference::Difference;
use crate::model::RunSet;
use crate::params::{Parameters, RunType};
use crate::simulation::Simulation;
use anyhow::{Context, Result};

/// A model of the epidemic that turns parameters into runs.
pub trait Engine {
    fn run(&self, params: &Parameters) -> Result<RunSet>;
}

/// Select the engine for `run_type`.
///
/// `seed` feeds the stochastic engine; the deterministic engines ignore it.
pub fn select_engine(run_type: RunType, seed: u64) -> Option<Box<dyn Engine>> {
    match run_type {
        RunType::Simulation => Some(Box::new(Simulation::new(seed))),
        RunType::DifEq => Some(Box::new(DifEq)),
        RunType::Difference => Some(Box::new(Difference)),
        RunType::Unknown => None,
    }
}

/// Validate `params` and compute a run set with the engine they name.
///
/// An unknown run type produces a run set without runs.
pub fn run(params: &Parameters, seed: u64) -> Result<RunSet> {
    params.validate().context("invalid parameters")?;

    let Some(engine) = select_engine(params.run_type, seed) else {
        log::warn!("unknown run type, returning empty run set");
        return Ok(RunSet::new(params.clone(), Vec::new()));
    };

    let run_set = engine.run(params)?;
    log::debug!(
        "{:?} finished {} run(s) for R0 = {}",
        params.run_type,
        run_set.runs.len(),
        params.r0
    );
    Ok(run_set)
}
