use crate::params::{Parameters, RiskDistribution, RiskVariance, RunType, transmission_rates};
use crate::utils::{check_num, check_vec};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, ops::Bound, path::Path};

/// Disease and population parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of individuals.
    pub n: usize,
    /// Number of steps an individual stays infectious.
    pub disease_length: usize,
    /// Basic reproduction number.
    pub r0: f64,
    /// Share of `r0` carried by risky contacts.
    pub hotspot_fraction: f64,
    /// Mean risk tolerance (absent means no risk heterogeneity).
    pub risk_mean: Option<f64>,
    #[serde(default)]
    pub risk_variance: RiskVariance,
}

/// How runs are carried out and recorded.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub run_type: RunType,
    pub trials: usize,
    #[serde(default = "default_initial_infected")]
    pub initial_infected: usize,
    #[serde(default)]
    pub extinction_shortcut: bool,
    #[serde(default)]
    pub detail: bool,
    /// Base seed (drawn from the OS when absent).
    pub seed: Option<u64>,
}

fn default_initial_infected() -> usize {
    1
}

/// Grid of an R0 sweep.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Largest R0 of every series.
    pub r0_end: f64,
    /// R0 increment between consecutive run sets.
    pub r0_step: f64,
    pub hotspot_fractions: Vec<f64>,
    pub risk_means: Vec<f64>,
    pub risk_variances: Vec<RiskVariance>,
}

impl SweepConfig {
    /// R0 values `0, r0_step, ...` up to and including `r0_end`.
    pub fn r0_values(&self) -> Vec<f64> {
        let n_steps = (self.r0_end / self.r0_step + 1e-9).floor() as usize;
        (0..=n_steps).map(|i_step| i_step as f64 * self.r0_step).collect()
    }
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub run: RunConfig,
    pub sweep: Option<SweepConfig>,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let model = &self.model;
        check_num(model.n, 1..=10_000_000).context("invalid population size")?;
        check_num(model.disease_length, 1..=1000).context("invalid disease length")?;
        check_num(model.r0, 0.0..=100.0).context("invalid basic reproduction number")?;
        check_num(model.hotspot_fraction, 0.0..=1.0).context("invalid hotspot fraction")?;
        if let Some(risk_mean) = model.risk_mean {
            check_num(risk_mean, open_unit()).context("invalid risk mean")?;
        }

        let run = &self.run;
        check_num(run.trials, 1..=1_000_000).context("invalid number of trials")?;
        check_num(run.initial_infected, 1..=model.n)
            .context("invalid initial number of infected")?;
        if run.extinction_shortcut && run.detail {
            bail!("extinction shortcut cannot be combined with detail");
        }

        if let Some(sweep) = &self.sweep {
            check_num(sweep.r0_end, 0.0..=100.0).context("invalid final R0")?;
            check_num(sweep.r0_step, (Bound::Excluded(0.0), Bound::Included(100.0)))
                .context("invalid R0 step")?;
            check_vec(&sweep.hotspot_fractions, 0.0..=1.0).context("invalid hotspot fractions")?;
            check_vec(&sweep.risk_means, open_unit()).context("invalid risk means")?;
            if sweep.risk_variances.is_empty() {
                bail!("risk variances must not be empty");
            }
        }
        Ok(())
    }

    /// Parameters of the single run set described by `[model]` and `[run]`.
    pub fn parameters(&self) -> Parameters {
        self.parameters_for(
            self.model.r0,
            self.model.hotspot_fraction,
            self.model.risk_mean,
            self.model.risk_variance,
        )
    }

    /// Parameters with the given R0, hotspot fraction and risk distribution,
    /// taking everything else from the config.
    pub fn parameters_for(
        &self,
        r0: f64,
        hotspot_fraction: f64,
        risk_mean: Option<f64>,
        risk_variance: RiskVariance,
    ) -> Parameters {
        let model = &self.model;
        let (beta_c, beta_r) = transmission_rates(
            r0,
            hotspot_fraction,
            risk_mean.unwrap_or(0.0),
            model.disease_length,
            model.n,
        );
        Parameters {
            n: model.n,
            beta_c,
            beta_r,
            disease_length: model.disease_length,
            risk_dist: risk_mean.map(|mean| RiskDistribution::from_mean(mean, risk_variance)),
            trials: self.run.trials,
            run_type: self.run.run_type,
            initial_infected: self.run.initial_infected,
            extinction_shortcut: self.run.extinction_shortcut,
            detail: self.run.detail,
            r0,
            risk_mean,
            risk_variance: risk_mean.map(|_| risk_variance),
            hotspot_fraction,
        }
    }
}

fn open_unit() -> (Bound<f64>, Bound<f64>) {
    (Bound::Excluded(0.0), Bound::Excluded(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CONFIG: &str = r#"
[model]
n = 1000
disease_length = 1
r0 = 4.0
hotspot_fraction = 0.5
risk_mean = 0.25
risk_variance = "low"

[run]
run_type = "simulation"
trials = 10
seed = 42

[sweep]
r0_end = 1.0
r0_step = 0.25
hotspot_fractions = [0.0, 0.5]
risk_means = [0.25]
risk_variances = ["low", "high"]
"#;

    #[test]
    fn parses_and_builds_parameters() {
        let cfg = Config::from_toml(CONFIG).unwrap();
        assert_eq!(cfg.run.run_type, RunType::Simulation);
        assert_eq!(cfg.run.initial_infected, 1);
        assert!(!cfg.run.detail);

        let params = cfg.parameters();
        assert_abs_diff_eq!(params.beta_c, 0.002, epsilon = 1e-12);
        assert_abs_diff_eq!(params.beta_r, 0.032, epsilon = 1e-12);
        assert_eq!(params.risk_dist, Some(RiskDistribution { a: 2.0, b: 6.0 }));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn sweep_covers_r0_range() {
        let cfg = Config::from_toml(CONFIG).unwrap();
        let sweep = cfg.sweep.unwrap();
        assert_eq!(sweep.r0_values(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn missing_risk_mean_disables_risk() {
        let contents = CONFIG.replace("risk_mean = 0.25\n", "");
        let cfg = Config::from_toml(&contents).unwrap();
        let params = cfg.parameters();
        assert_eq!(params.risk_dist, None);
        assert_eq!(params.beta_r, 0.0);
        assert_eq!(params.risk_variance, None);
    }

    #[test]
    fn rejects_invalid_values() {
        let contents = CONFIG.replace("risk_mean = 0.25", "risk_mean = 0.0");
        assert!(Config::from_toml(&contents).is_err());

        let contents = CONFIG.replace("trials = 10", "trials = 0");
        assert!(Config::from_toml(&contents).is_err());

        let contents = CONFIG.replace(
            "seed = 42",
            "seed = 42\ndetail = true\nextinction_shortcut = true",
        );
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn unknown_run_type_is_accepted() {
        let contents = CONFIG.replace("\"simulation\"", "\"network\"");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.run.run_type, RunType::Unknown);
    }
}
