use crate::engine::Engine;
use crate::meanfield::{BUCKETS, END_THRESHOLD, Population};
use crate::metrics::Outbreak;
use crate::model::{Run, RunSet};
use crate::params::Parameters;
use anyhow::{Context, Result, bail};

/// New infections in a bucket with susceptible mass `s` and risk level `risk`.
///
/// Uses the exact escape probability `(1 - beta_c)^sum_i` from the community
/// and `1 - risk + risk * (1 - beta_r)^moment_i` from risky contacts, instead
/// of the linear hazard, which overshoots when `s` and `sum_i` are both large.
pub fn new_infections(
    s: f64,
    sum_i: f64,
    moment_i: f64,
    risk: f64,
    beta_c: f64,
    beta_r: f64,
) -> f64 {
    let escape_com = (1.0 - beta_c).powf(sum_i);
    let escape_risky = 1.0 - risk + risk * (1.0 - beta_r).powf(moment_i);
    s * (1.0 - escape_com * escape_risky)
}

/// Mean-field engine stepping one infectious generation at a time.
///
/// Every infected bucket recovers after one step, so the disease length must be 1.
pub struct Difference;

impl Engine for Difference {
    fn run(&self, params: &Parameters) -> Result<RunSet> {
        params.validate().context("invalid parameters")?;
        if params.disease_length != 1 {
            bail!(
                "difference engine requires a disease length of 1, but it is {}",
                params.disease_length
            );
        }

        let mut pop = Population::new(params).context("failed to initialize population")?;

        let mut run = Run::default();
        let mut is = Vec::new();
        let mut new_inf = vec![0.0; BUCKETS];

        let mut step = 0;
        loop {
            let sum_i = pop.sum_i();
            if sum_i < END_THRESHOLD {
                break;
            }
            is.push(sum_i);
            if params.detail {
                run.ts.push(step as f64);
                run.ss.push(pop.sum_s());
                run.is.push(sum_i);
                run.rs.push(pop.sum_r());
            }

            let moment_i = pop.moment_i();
            for (i_bkt, inf) in new_inf.iter_mut().enumerate() {
                *inf = new_infections(
                    pop.s[i_bkt],
                    sum_i,
                    moment_i,
                    pop.risk(i_bkt),
                    params.beta_c,
                    params.beta_r,
                );
            }

            for i_bkt in 0..BUCKETS {
                pop.s[i_bkt] -= new_inf[i_bkt];
                pop.r[i_bkt] += pop.i[i_bkt];
                pop.i[i_bkt] = new_inf[i_bkt];
            }
            step += 1;
        }
        log::debug!("stepped through {step} generations");

        pop.recover_remaining();
        if params.detail {
            run.ts.push(step as f64);
            run.ss.push(pop.sum_s());
            run.is.push(0.0);
            run.rs.push(pop.sum_r());
        }

        let outbreak = Outbreak::measure(&is, params.n, 1.0);
        run.final_r = pop.sum_r();
        run.max_i = outbreak.max_i;
        run.duration = outbreak.duration;
        run.peak_time = outbreak.peak_time;
        Ok(RunSet::new(params.clone(), vec![run]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{RiskDistribution, tests::default_params};
    use approx::assert_abs_diff_eq;

    #[test]
    fn new_infections_examples() {
        for (s, sum_i, moment_i, risk, beta_c, beta_r, want) in [
            (1000.0, 1.0, 0.0, 0.0, 0.001, 0.0, 1.0),
            (1000.0, 1.0, 1.0, 1.0, 0.0, 0.001, 1.0),
            (1000.0, 1.0, 1.0, 1.0, 0.0, 0.002, 2.0),
            (1000.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1000.0),
        ] {
            let got = new_infections(s, sum_i, moment_i, risk, beta_c, beta_r);
            assert_abs_diff_eq!(got, want, epsilon = 1e-4);
        }
    }

    #[test]
    fn longer_disease_is_rejected() {
        let mut params = default_params();
        params.disease_length = 2;
        assert!(Difference.run(&params).is_err());
    }

    #[test]
    fn detailed_run_conserves_mass() {
        let mut params = default_params();
        params.beta_c = 1.5 / params.n as f64;
        params.beta_r = 8.0 / params.n as f64;
        params.risk_dist = Some(RiskDistribution { a: 2.0, b: 6.0 });
        params.detail = true;

        let run = &Difference.run(&params).unwrap().runs[0];
        for ((s, i), r) in run.ss.iter().zip(&run.is).zip(&run.rs) {
            assert_abs_diff_eq!(s + i + r, 1000.0, epsilon = 1e-6);
        }
        assert!(run.rs.windows(2).all(|w| w[0] <= w[1]));
        assert!(run.final_r > 1.0 && run.final_r <= 1000.0 + 1e-6);
        assert_eq!(run.is.last(), Some(&0.0));
        assert_eq!(run.rs.last(), Some(&run.final_r));
        assert_eq!(run.max_i, run.is.iter().copied().fold(0.0, f64::max));
    }
}
