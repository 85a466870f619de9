//! Simulation data types.

use crate::params::{Parameters, RiskVariance, RunType};
use serde::{Deserialize, Serialize};

/// Infection status of an individual.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    Susceptible,
    Infected,
    Recovered,
}

/// Individual of the agent-based model.
#[derive(Debug, Clone)]
pub struct Individual {
    status: Status,
    days_infected: usize,
    risk_tolerance: f64,
}

impl Individual {
    /// Create a susceptible individual with a fixed risk tolerance.
    pub fn new(risk_tolerance: f64) -> Self {
        Self {
            status: Status::Susceptible,
            days_infected: 0,
            risk_tolerance,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn risk_tolerance(&self) -> f64 {
        self.risk_tolerance
    }

    /// Whether the individual can transmit this step.
    ///
    /// Individuals infected during the current step are not yet infectious.
    pub fn is_infectious(&self) -> bool {
        self.status == Status::Infected && self.days_infected > 0
    }

    pub fn infect(&mut self) {
        if self.status == Status::Susceptible {
            self.status = Status::Infected;
        }
    }

    pub fn recover(&mut self) {
        if self.status == Status::Infected {
            self.status = Status::Recovered;
        }
    }

    /// Advance the disease by one step, recovering after `disease_length` steps.
    pub fn progress(&mut self, disease_length: usize) {
        if self.status != Status::Infected {
            return;
        }
        if self.days_infected >= disease_length {
            self.status = Status::Recovered;
        } else {
            self.days_infected += 1;
        }
    }
}

/// Outcome of one trial or one integration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Run {
    /// Final number (or mass) of recovered individuals.
    pub final_r: f64,
    /// Peak number of concurrently infected individuals.
    pub max_i: f64,
    /// Time spent at or above the outbreak threshold.
    pub duration: f64,
    /// Time at which infection peaks.
    pub peak_time: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ts: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ss: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rs: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rts: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effective_betas: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub i_risks: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub s_risks: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risky_infections: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub community_infections: Vec<f64>,
}

/// Parameters together with the runs computed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunSet {
    pub parameters: Parameters,
    pub runs: Vec<Run>,
}

impl RunSet {
    pub fn new(parameters: Parameters, runs: Vec<Run>) -> Self {
        Self { parameters, runs }
    }
}

/// Run sets sharing everything but `R0`, ordered by increasing `R0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct R0Series {
    pub run_type: RunType,
    pub risk_mean: f64,
    pub risk_variance: RiskVariance,
    pub hotspot_fraction: f64,
    pub run_sets: Vec<RunSet>,
}
