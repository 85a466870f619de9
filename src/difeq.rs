use crate::engine::Engine;
use crate::meanfield::{BUCKETS, END_THRESHOLD, Population};
use crate::metrics::Outbreak;
use crate::model::{Run, RunSet};
use crate::params::Parameters;
use anyhow::{Context, Result};

/// Integration time step.
pub const DT: f64 = 0.01;

/// Steps between two diagnostic records.
const STEPS_PER_SAVE: usize = 10;

/// Mean-field engine integrating the linearised differential equations with
/// explicit Euler steps of length [`DT`].
pub struct DifEq;

impl Engine for DifEq {
    fn run(&self, params: &Parameters) -> Result<RunSet> {
        params.validate().context("invalid parameters")?;

        let mut pop = Population::new(params).context("failed to initialize population")?;
        let gamma = 1.0 / params.disease_length as f64;

        let mut run = Run::default();
        let mut is = Vec::new();
        let mut new_inf = vec![0.0; BUCKETS];
        let mut rec = vec![0.0; BUCKETS];

        let mut step = 0;
        loop {
            let sum_i = pop.sum_i();
            if sum_i < END_THRESHOLD {
                break;
            }
            is.push(sum_i);

            let moment_i = pop.moment_i();
            let mut com_inf_sum = 0.0;
            let mut risky_inf_sum = 0.0;
            for i_bkt in 0..BUCKETS {
                let com_inf = pop.s[i_bkt] * params.beta_c * sum_i * DT;
                let risky_inf = pop.s[i_bkt] * pop.risk(i_bkt) * params.beta_r * moment_i * DT;
                new_inf[i_bkt] = com_inf + risky_inf;
                rec[i_bkt] = pop.i[i_bkt] * gamma * DT;
                com_inf_sum += com_inf;
                risky_inf_sum += risky_inf;
            }

            if params.detail && step % STEPS_PER_SAVE == 0 {
                let sum_s = pop.sum_s();
                let i_risk = moment_i / sum_i;
                let s_risk = if sum_s > 0.0 { pop.moment_s() / sum_s } else { 0.0 };
                let effective_beta = params.beta_c + params.beta_r * i_risk * s_risk;

                run.ts.push(step as f64 * DT);
                run.ss.push(sum_s);
                run.is.push(sum_i);
                run.rs.push(pop.sum_r());
                run.rts.push(sum_s * effective_beta);
                run.effective_betas.push(effective_beta);
                run.i_risks.push(i_risk);
                run.s_risks.push(s_risk);
                run.community_infections.push(com_inf_sum);
                run.risky_infections.push(risky_inf_sum);
            }

            for i_bkt in 0..BUCKETS {
                pop.s[i_bkt] -= new_inf[i_bkt];
                pop.i[i_bkt] += new_inf[i_bkt] - rec[i_bkt];
                pop.r[i_bkt] += rec[i_bkt];
            }
            step += 1;
        }
        log::debug!("integrated {step} steps of length {DT}");

        pop.recover_remaining();
        if params.detail {
            let sum_s = pop.sum_s();
            let s_risk = if sum_s > 0.0 { pop.moment_s() / sum_s } else { 0.0 };
            run.ts.push(step as f64 * DT);
            run.ss.push(sum_s);
            run.is.push(0.0);
            run.rs.push(pop.sum_r());
            run.rts.push(sum_s * params.beta_c);
            run.effective_betas.push(params.beta_c);
            run.i_risks.push(0.0);
            run.s_risks.push(s_risk);
            run.community_infections.push(0.0);
            run.risky_infections.push(0.0);
        }

        let outbreak = Outbreak::measure(&is, params.n, DT);
        run.final_r = pop.sum_r();
        run.max_i = outbreak.max_i;
        run.duration = outbreak.duration;
        run.peak_time = outbreak.peak_time;
        Ok(RunSet::new(params.clone(), vec![run]))
    }
}
