use crate::metrics::is_extinct;
use crate::model::{R0Series, Run, RunSet};
use crate::params::Parameters;
use crate::stats::Accumulator;
use crate::utils::{read_msgpack, write_msgpack};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_value::Value;
use std::{collections::BTreeMap, path::Path};

/// Quantity observed over the runs of a run set.
pub trait Obs {
    fn name(&self) -> &'static str;
    fn update(&mut self, run: &Run);
    fn report(&self) -> Result<Value>;
}

/// Mean and spread of one scalar outcome of each run.
pub struct RunQuantity {
    name: &'static str,
    get: fn(&Run) -> f64,
    acc: Accumulator,
}

impl RunQuantity {
    pub fn new(name: &'static str, get: fn(&Run) -> f64) -> Self {
        Self {
            name,
            get,
            acc: Accumulator::new(),
        }
    }
}

impl Obs for RunQuantity {
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, run: &Run) {
        self.acc.add((self.get)(run));
    }

    fn report(&self) -> Result<Value> {
        serde_value::to_value(self.acc.report()).context("failed to convert report")
    }
}

/// Fraction of runs whose final size stays below the extinction cutoff.
#[derive(Default)]
pub struct ExtinctionProb {
    n_runs: usize,
    n_extinct: usize,
}

impl Obs for ExtinctionProb {
    fn name(&self) -> &'static str {
        "ExtinctionProb"
    }

    fn update(&mut self, run: &Run) {
        self.n_runs += 1;
        if is_extinct(run.final_r) {
            self.n_extinct += 1;
        }
    }

    fn report(&self) -> Result<Value> {
        let prob = if self.n_runs == 0 {
            f64::NAN
        } else {
            self.n_extinct as f64 / self.n_runs as f64
        };
        Ok(Value::F64(prob))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunSetReport {
    pub parameters: Parameters,
    pub observables: BTreeMap<String, Value>,
}

fn default_observables() -> Vec<Box<dyn Obs>> {
    let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
    obs_ptr_vec.push(Box::new(RunQuantity::new("FinalR", |run| run.final_r)));
    obs_ptr_vec.push(Box::new(RunQuantity::new("MaxI", |run| run.max_i)));
    obs_ptr_vec.push(Box::new(RunQuantity::new("Duration", |run| run.duration)));
    obs_ptr_vec.push(Box::new(RunQuantity::new("PeakTime", |run| run.peak_time)));
    obs_ptr_vec.push(Box::new(ExtinctionProb::default()));
    obs_ptr_vec
}

/// Collects one report per analyzed run set.
#[derive(Default)]
pub struct Analyzer {
    reports: Vec<RunSetReport>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[RunSetReport] {
        &self.reports
    }

    pub fn add_run_set(&mut self, run_set: &RunSet) -> Result<()> {
        let mut obs_ptr_vec = default_observables();
        for run in &run_set.runs {
            for obs in &mut obs_ptr_vec {
                obs.update(run);
            }
        }

        let mut observables = BTreeMap::new();
        for obs in &obs_ptr_vec {
            let report = obs
                .report()
                .with_context(|| format!("failed to report {}", obs.name()))?;
            observables.insert(obs.name().to_string(), report);
        }

        self.reports.push(RunSetReport {
            parameters: run_set.parameters.clone(),
            observables,
        });
        Ok(())
    }

    pub fn add_run_set_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let run_set: RunSet = read_msgpack(file).context("failed to read run set")?;
        self.add_run_set(&run_set)
    }

    pub fn add_series_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let series_vec: Vec<R0Series> = read_msgpack(file).context("failed to read series")?;
        for series in &series_vec {
            for run_set in &series.run_sets {
                self.add_run_set(run_set)?;
            }
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        write_msgpack(file, &self.reports).context("failed to write reports")
    }
}
