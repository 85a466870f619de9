//! Risk tolerance sampling for both population representations.

use crate::params::RiskDistribution;
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Beta, Distribution};
use statrs::distribution::{Beta as BetaCdf, ContinuousCDF};

/// Draw `n` independent risk tolerances.
///
/// Without a distribution every tolerance is zero.
pub fn sample_risk_tolerances<R: Rng + ?Sized>(
    risk_dist: Option<&RiskDistribution>,
    n: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let Some(risk_dist) = risk_dist else {
        return Ok(vec![0.0; n]);
    };
    let beta = Beta::new(risk_dist.a, risk_dist.b).context("failed to build Beta distribution")?;
    Ok(beta.sample_iter(rng).take(n).collect())
}

/// Population mass in each of `buckets` equal-width risk intervals.
///
/// Masses sum to `n`. Without a distribution the mass is spread uniformly.
pub fn bucket_masses(
    risk_dist: Option<&RiskDistribution>,
    n: usize,
    buckets: usize,
) -> Result<Vec<f64>> {
    let (a, b) = risk_dist.map_or((1.0, 1.0), |risk_dist| (risk_dist.a, risk_dist.b));
    let beta = BetaCdf::new(a, b).context("failed to build Beta distribution")?;

    let n = n as f64;
    let masses = (0..buckets)
        .map(|i_bkt| {
            let lower = i_bkt as f64 / buckets as f64;
            let upper = (i_bkt + 1) as f64 / buckets as f64;
            n * (beta.cdf(upper) - beta.cdf(lower))
        })
        .collect();
    Ok(masses)
}
