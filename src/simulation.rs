use crate::engine::Engine;
use crate::metrics::{EXTINCTION_CUTOFF, Outbreak};
use crate::model::{Individual, Run, RunSet, Status};
use crate::params::Parameters;
use crate::risk::sample_risk_tolerances;
use anyhow::{Context, Result};
use rand::{Rng, SeedableRng, seq::index};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Distribution};

/// Probability of infection after `n_contacts` contacts with infectious
/// individuals, each transmitting with probability `beta`.
pub fn infection_probability(beta: f64, n_contacts: f64) -> f64 {
    1.0 - (1.0 - beta).powf(n_contacts)
}

/// Agent-based Monte Carlo engine.
///
/// Trial `i_trial` draws from stream `i_trial` of a ChaCha generator seeded
/// with `seed`, so trials are independent and can be replayed one by one.
pub struct Simulation {
    seed: u64,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn trial_rng(&self, i_trial: usize) -> ChaCha12Rng {
        let mut rng = ChaCha12Rng::seed_from_u64(self.seed);
        rng.set_stream(i_trial as u64);
        rng
    }
}

impl Engine for Simulation {
    fn run(&self, params: &Parameters) -> Result<RunSet> {
        params.validate().context("invalid parameters")?;

        let mut runs = Vec::with_capacity(params.trials);
        for i_trial in 0..params.trials {
            let mut rng = self.trial_rng(i_trial);
            let run = Trial::new(params, &mut rng)
                .with_context(|| format!("failed to set up trial {i_trial}"))?
                .perform(&mut rng)
                .with_context(|| format!("failed to perform trial {i_trial}"))?;
            log::debug!("trial {i_trial} ended with {} recovered", run.final_r);
            runs.push(run);
        }
        Ok(RunSet::new(params.clone(), runs))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    susceptible: usize,
    infected: usize,
    recovered: usize,
}

/// State of a single trial.
struct Trial<'a> {
    params: &'a Parameters,
    pop: Vec<Individual>,
}

impl<'a> Trial<'a> {
    fn new<R: Rng>(params: &'a Parameters, rng: &mut R) -> Result<Self> {
        let tolerances = sample_risk_tolerances(params.risk_dist.as_ref(), params.n, rng)
            .context("failed to sample risk tolerances")?;
        let mut pop: Vec<_> = tolerances.into_iter().map(Individual::new).collect();

        for i_ind in index::sample(rng, params.n, params.initial_infected) {
            pop[i_ind].infect();
        }

        Ok(Self { params, pop })
    }

    fn perform<R: Rng>(mut self, rng: &mut R) -> Result<Run> {
        let n = self.params.n;
        let mut run = Run::default();
        let mut is = Vec::new();

        let mut i_ind_risk = Vec::with_capacity(n);
        let i_ind_all: Vec<_> = (0..n).collect();

        let mut step = 0;
        loop {
            let counts = self.count_status();
            debug_assert_eq!(counts.susceptible + counts.infected + counts.recovered, n);
            if counts.infected == 0 {
                break;
            }

            is.push(counts.infected as f64);
            if self.params.detail {
                run.ts.push(step as f64);
                run.ss.push(counts.susceptible as f64);
                run.is.push(counts.infected as f64);
                run.rs.push(counts.recovered as f64);
            }

            // Once the cutoff is crossed the trial can no longer go extinct.
            if self.params.extinction_shortcut
                && counts.recovered + counts.infected >= EXTINCTION_CUTOFF
            {
                log::trace!("extinction shortcut at step {step}");
                self.pop.iter_mut().for_each(Individual::recover);
                break;
            }

            self.perform_step(&mut i_ind_risk, &i_ind_all, rng)
                .with_context(|| format!("failed to perform step {step}"))?;
            step += 1;
        }

        let counts = self.count_status();
        if self.params.detail {
            run.ts.push(step as f64);
            run.ss.push(counts.susceptible as f64);
            run.is.push(counts.infected as f64);
            run.rs.push(counts.recovered as f64);
        }

        let outbreak = Outbreak::measure(&is, n, 1.0);
        run.final_r = counts.recovered as f64;
        run.max_i = outbreak.max_i;
        run.duration = outbreak.duration;
        run.peak_time = outbreak.peak_time;
        Ok(run)
    }

    fn perform_step<R: Rng>(
        &mut self,
        i_ind_risk: &mut Vec<usize>,
        i_ind_all: &[usize],
        rng: &mut R,
    ) -> Result<()> {
        // Select this step's risk takers.
        i_ind_risk.clear();
        for (i_ind, ind) in self.pop.iter().enumerate() {
            if rng.random::<f64>() < ind.risk_tolerance() {
                i_ind_risk.push(i_ind);
            }
        }

        // Risky spread among risk takers.
        self.spread_within(i_ind_risk, self.params.beta_r, rng)
            .context("failed to spread among risk takers")?;

        // Community spread over the whole population.
        self.spread_within(i_ind_all, self.params.beta_c, rng)
            .context("failed to spread in the community")?;

        // Recovery.
        let disease_length = self.params.disease_length;
        self.pop.iter_mut().for_each(|ind| ind.progress(disease_length));

        Ok(())
    }

    fn spread_within<R: Rng>(
        &mut self,
        i_ind_sub: &[usize],
        beta: f64,
        rng: &mut R,
    ) -> Result<()> {
        let n_infectious = i_ind_sub
            .iter()
            .filter(|&&i_ind| self.pop[i_ind].is_infectious())
            .count();
        if n_infectious == 0 {
            return Ok(());
        }

        let inf_dist = Bernoulli::new(infection_probability(beta, n_infectious as f64))?;
        for &i_ind in i_ind_sub {
            let ind = &mut self.pop[i_ind];
            if ind.status() == Status::Susceptible && inf_dist.sample(rng) {
                ind.infect();
            }
        }
        Ok(())
    }

    fn count_status(&self) -> Counts {
        let mut counts = Counts::default();
        for ind in &self.pop {
            match ind.status() {
                Status::Susceptible => counts.susceptible += 1,
                Status::Infected => counts.infected += 1,
                Status::Recovered => counts.recovered += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{RiskDistribution, tests::default_params};

    #[test]
    fn infection_probability_examples() {
        assert_eq!(infection_probability(0.5, 0.0), 0.0);
        assert_eq!(infection_probability(0.3, 0.0), 0.0);
        assert_eq!(infection_probability(0.5, 1.0), 0.5);
        assert_eq!(infection_probability(0.5, 2.0), 0.75);
        assert_eq!(infection_probability(1.0, 3.0), 1.0);
        assert_eq!(infection_probability(0.0, 3.0), 0.0);
    }

    #[test]
    fn detailed_trials_conserve_population() {
        let mut params = default_params();
        params.n = 300;
        params.trials = 5;
        params.beta_c = 2.0 / 300.0;
        params.beta_r = 0.02;
        params.detail = true;

        let run_set = Simulation::new(11).run(&params).unwrap();
        assert_eq!(run_set.runs.len(), 5);
        for run in &run_set.runs {
            assert!(run.final_r <= 300.0);
            for ((s, i), r) in run.ss.iter().zip(&run.is).zip(&run.rs) {
                assert_eq!(s + i + r, 300.0);
            }
            assert!(run.rs.windows(2).all(|w| w[0] <= w[1]));
            assert!(run.max_i >= 1.0);
            assert_eq!(run.is.last(), Some(&0.0));
            assert_eq!(run.rs.last(), Some(&run.final_r));
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut params = default_params();
        params.n = 10;
        params.initial_infected = 11;
        assert!(Simulation::new(0).run(&params).is_err());
    }

    #[test]
    fn same_seed_reproduces_trials() {
        let mut params = default_params();
        params.n = 200;
        params.trials = 3;
        params.beta_c = 3.0 / 200.0;

        let a = Simulation::new(5).run(&params).unwrap();
        let b = Simulation::new(5).run(&params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn no_risk_distribution_disables_risky_channel() {
        let mut params = default_params();
        params.n = 200;
        params.trials = 20;
        params.beta_r = 1.0;
        params.risk_dist = None;

        for run in Simulation::new(3).run(&params).unwrap().runs {
            assert_eq!(run.final_r, 1.0);
        }
    }

    #[test]
    fn certain_risky_transmission_reaches_all_risk_takers() {
        let mut params = default_params();
        params.n = 100;
        params.trials = 3;
        params.beta_r = 1.0;
        params.disease_length = 5;
        params.risk_dist = Some(RiskDistribution { a: 200.0, b: 1.0 });

        for run in Simulation::new(9).run(&params).unwrap().runs {
            assert!(run.final_r > 90.0);
        }
    }

    #[test]
    fn extinction_shortcut_stops_early() {
        let mut params = default_params();
        params.n = 1000;
        params.trials = 10;
        params.beta_c = 3.0 / 1000.0;
        params.extinction_shortcut = true;

        // Trials either die out early or stop soon after crossing the cutoff.
        for run in Simulation::new(4).run(&params).unwrap().runs {
            assert!(run.final_r < 300.0);
        }
    }
}
