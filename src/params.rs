use crate::utils::check_num;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::ops::Bound;

/// Shape parameters of the Beta distribution of risk tolerances.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RiskDistribution {
    pub a: f64,
    pub b: f64,
}

impl RiskDistribution {
    /// Shape parameters giving mean `risk_mean` with spread set by `risk_variance`.
    ///
    /// Never fails: a zero mean produces an infinite `b`, so callers must keep
    /// the mean strictly positive before handing the result to an engine.
    pub fn from_mean(risk_mean: f64, risk_variance: RiskVariance) -> Self {
        let factor = risk_variance.factor();
        Self {
            a: factor,
            b: factor * (1.0 - risk_mean) / risk_mean,
        }
    }

    pub fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }

    fn validate(&self) -> Result<()> {
        let positive = (Bound::Excluded(0.0), Bound::Unbounded);
        check_num(self.a, positive).context("invalid shape parameter a")?;
        check_num(self.b, positive).context("invalid shape parameter b")?;
        if !self.a.is_finite() || !self.b.is_finite() {
            bail!("shape parameters must be finite");
        }
        Ok(())
    }
}

/// Coarse spread of the risk distribution around its mean.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskVariance {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskVariance {
    fn factor(self) -> f64 {
        match self {
            RiskVariance::Low => 2.0,
            RiskVariance::Medium => 1.0,
            RiskVariance::High => 0.1,
        }
    }
}

/// Engine used to compute a [`crate::model::RunSet`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Simulation,
    DifEq,
    Difference,
    #[serde(other)]
    Unknown,
}

/// Parameters of one set of runs.
///
/// `r0`, `risk_mean`, `risk_variance` and `hotspot_fraction` only label the
/// run set; engines read the transmission rates and the risk distribution.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameters {
    /// Number of individuals.
    pub n: usize,
    /// Community transmission probability per contact.
    pub beta_c: f64,
    /// Risky transmission probability per contact.
    pub beta_r: f64,
    /// Number of steps an individual stays infectious.
    pub disease_length: usize,
    /// Risk tolerance distribution (`None` means every tolerance is zero).
    pub risk_dist: Option<RiskDistribution>,
    /// Number of independent trials (stochastic engine only).
    pub trials: usize,
    pub run_type: RunType,

    /// Number of individuals infected at the start.
    #[serde(default = "default_initial_infected")]
    pub initial_infected: usize,
    /// Stop a trial as soon as it is certain not to go extinct.
    #[serde(default)]
    pub extinction_shortcut: bool,
    /// Record time series in every run.
    #[serde(default)]
    pub detail: bool,

    #[serde(rename = "R0")]
    pub r0: f64,
    pub risk_mean: Option<f64>,
    pub risk_variance: Option<RiskVariance>,
    pub hotspot_fraction: f64,
}

fn default_initial_infected() -> usize {
    1
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        check_num(self.n, 1..).context("invalid population size")?;
        check_num(self.beta_c, 0.0..=1.0)
            .context("invalid community transmission probability")?;
        check_num(self.beta_r, 0.0..=1.0).context("invalid risky transmission probability")?;
        check_num(self.disease_length, 1..).context("invalid disease length")?;
        check_num(self.trials, 1..).context("invalid number of trials")?;
        check_num(self.initial_infected, 1..=self.n)
            .context("invalid initial number of infected")?;
        if let Some(risk_dist) = &self.risk_dist {
            risk_dist.validate().context("invalid risk distribution")?;
        }
        if self.extinction_shortcut && self.detail {
            bail!("extinction shortcut distorts time series and cannot be combined with detail");
        }
        Ok(())
    }
}

/// Split `r0` into community and risky transmission probabilities.
///
/// The community channel carries `r0 * (1 - hotspot_fraction)` and the risky
/// channel `r0 * hotspot_fraction`. Risky contacts need both ends to take the
/// risk, so the risky rate is divided by the squared mean risk tolerance.
/// Returns `(beta_c, beta_r)`.
pub fn transmission_rates(
    r0: f64,
    hotspot_fraction: f64,
    risk_mean: f64,
    disease_length: usize,
    n: usize,
) -> (f64, f64) {
    let gamma = 1.0 / disease_length as f64;
    let n = n as f64;
    let beta_c = gamma * r0 * (1.0 - hotspot_fraction) / n;
    let beta_r = gamma * r0 * hotspot_fraction / risk_mean / risk_mean / n;
    let beta_r = if beta_r.is_finite() { beta_r } else { 0.0 };
    (beta_c, beta_r)
}

/// Community and risky components `(r0_c, r0_r)` implied by `params`.
pub fn compute_r0(params: &Parameters) -> (f64, f64) {
    let scale = params.n as f64 * params.disease_length as f64;
    let r0_c = params.beta_c * scale;
    let r0_r = match &params.risk_dist {
        Some(risk_dist) => risk_dist.mean().powi(2) * params.beta_r * scale,
        None => 0.0,
    };
    (r0_c, r0_r)
}
