//! Bucketed continuum population used by the mean-field engines.

use crate::params::Parameters;
use crate::risk::bucket_masses;
use anyhow::{Context, Result};

/// Number of risk buckets.
pub const BUCKETS: usize = 100;

/// Infected mass below which integration stops.
pub const END_THRESHOLD: f64 = 0.1;

/// Representative risk level of bucket `i_bkt` out of `buckets`.
pub fn risk_value(i_bkt: usize, buckets: usize) -> f64 {
    (i_bkt as f64 + 0.5) / buckets as f64
}

/// Susceptible, infected and recovered mass per risk bucket.
#[derive(Debug, Clone)]
pub struct Population {
    pub s: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
    risk: Vec<f64>,
}

impl Population {
    /// Distribute `n` over the buckets and move `initial_infected` mass from S to I,
    /// proportionally to each bucket's size.
    ///
    /// Without a risk distribution every bucket has risk level zero, which
    /// disables the risky channel.
    pub fn new(params: &Parameters) -> Result<Self> {
        let masses = bucket_masses(params.risk_dist.as_ref(), params.n, BUCKETS)
            .context("failed to compute bucket masses")?;

        let frac_inf = params.initial_infected as f64 / params.n as f64;
        let s = masses.iter().map(|m| m * (1.0 - frac_inf)).collect();
        let i = masses.iter().map(|m| m * frac_inf).collect();
        let r = vec![0.0; BUCKETS];

        let risk = match params.risk_dist {
            Some(_) => (0..BUCKETS).map(|i_bkt| risk_value(i_bkt, BUCKETS)).collect(),
            None => vec![0.0; BUCKETS],
        };

        Ok(Self { s, i, r, risk })
    }

    /// Move the infected mass left below [`END_THRESHOLD`] to R.
    pub fn recover_remaining(&mut self) {
        for (i, r) in self.i.iter_mut().zip(&mut self.r) {
            *r += *i;
            *i = 0.0;
        }
    }

    pub fn risk(&self, i_bkt: usize) -> f64 {
        self.risk[i_bkt]
    }

    pub fn sum_s(&self) -> f64 {
        self.s.iter().sum()
    }

    pub fn sum_i(&self) -> f64 {
        self.i.iter().sum()
    }

    pub fn sum_r(&self) -> f64 {
        self.r.iter().sum()
    }

    /// Risk-weighted first moment of the susceptible mass.
    pub fn moment_s(&self) -> f64 {
        self.first_moment(&self.s)
    }

    /// Risk-weighted first moment of the infected mass.
    pub fn moment_i(&self) -> f64 {
        self.first_moment(&self.i)
    }

    fn first_moment(&self, mass: &[f64]) -> f64 {
        mass.iter().zip(&self.risk).map(|(m, p)| m * p).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{RiskDistribution, tests::default_params};
    use approx::assert_abs_diff_eq;

    #[test]
    fn risk_value_is_bucket_midpoint() {
        assert_abs_diff_eq!(risk_value(0, 10), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(risk_value(9, 10), 0.95, epsilon = 1e-12);
    }

    #[test]
    fn initial_population_seeds_one_infected() {
        for (a, b) in [(1.0, 1.0), (2.0, 2.0), (0.1, 0.1), (1.0, 3.0), (0.3, 0.1)] {
            let mut params = default_params();
            params.risk_dist = Some(RiskDistribution { a, b });
            let pop = Population::new(&params).unwrap();
            assert_abs_diff_eq!(pop.sum_s(), 999.0, epsilon = 1e-4);
            assert_abs_diff_eq!(pop.sum_i(), 1.0, epsilon = 1e-4);
            assert_eq!(pop.sum_r(), 0.0);
        }
    }

    #[test]
    fn missing_distribution_has_no_risk() {
        let mut params = default_params();
        params.risk_dist = None;
        let pop = Population::new(&params).unwrap();
        assert_eq!(pop.moment_i(), 0.0);
        assert_eq!(pop.moment_s(), 0.0);
        assert_abs_diff_eq!(pop.sum_i(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn remaining_infected_mass_recovers() {
        let mut params = default_params();
        params.initial_infected = 3;
        let mut pop = Population::new(&params).unwrap();
        pop.recover_remaining();
        assert_eq!(pop.sum_i(), 0.0);
        assert_abs_diff_eq!(pop.sum_r(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pop.sum_s() + pop.sum_r(), 1000.0, epsilon = 1e-9);
    }
}
