use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine;
use crate::model::R0Series;
use crate::params::compute_r0;
use crate::utils::write_msgpack;
use anyhow::{Context, Result};
use glob::glob;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Compute the run set described by the config and save it in a new run dir.
    pub fn run_simulation(&self) -> Result<()> {
        let run_dir = self.create_run_dir().context("failed to create run dir")?;
        let seed = self.seed();

        let params = self.cfg.parameters();
        let (r0_c, r0_r) = compute_r0(&params);
        log::info!("R0c = {r0_c}, R0r = {r0_r}");

        let run_set = engine::run(&params, seed).context("failed to compute run set")?;
        log::info!("computed {} run(s)", run_set.runs.len());

        let file = run_dir.join("run-set.msgpack");
        write_msgpack(&file, &run_set).with_context(|| format!("failed to save {file:?}"))?;

        Ok(())
    }

    /// Compute an R0 series for every point of the sweep grid and save them
    /// in a new run dir.
    pub fn run_sweep(&self) -> Result<()> {
        let sweep = self.cfg.sweep.as_ref().context("config has no sweep section")?;
        let run_dir = self.create_run_dir().context("failed to create run dir")?;
        let mut seeder = ChaCha12Rng::seed_from_u64(self.seed());

        let r0_values = sweep.r0_values();
        let n_series =
            sweep.hotspot_fractions.len() * sweep.risk_means.len() * sweep.risk_variances.len();

        let mut series_vec = Vec::with_capacity(n_series);
        for &hotspot_fraction in &sweep.hotspot_fractions {
            for &risk_mean in &sweep.risk_means {
                for &risk_variance in &sweep.risk_variances {
                    let mut run_sets = Vec::with_capacity(r0_values.len());
                    for &r0 in &r0_values {
                        let params = self.cfg.parameters_for(
                            r0,
                            hotspot_fraction,
                            Some(risk_mean),
                            risk_variance,
                        );
                        let run_set = engine::run(&params, seeder.random())
                            .with_context(|| format!("failed to compute run set for {params:?}"))?;
                        run_sets.push(run_set);
                    }

                    series_vec.push(R0Series {
                        run_type: self.cfg.run.run_type,
                        risk_mean,
                        risk_variance,
                        hotspot_fraction,
                        run_sets,
                    });

                    let progress = 100.0 * series_vec.len() as f64 / n_series as f64;
                    log::info!("completed {progress:06.2}%");
                }
            }
        }

        let file = run_dir.join("series.msgpack");
        write_msgpack(&file, &series_vec).with_context(|| format!("failed to save {file:?}"))?;

        Ok(())
    }

    /// Summarize every saved run set of every run dir.
    pub fn run_analysis(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            let mut analyzer = Analyzer::new();

            let run_set_file = run_dir.join("run-set.msgpack");
            if run_set_file.is_file() {
                analyzer
                    .add_run_set_file(&run_set_file)
                    .with_context(|| format!("failed to add {run_set_file:?}"))?;
            }
            let series_file = run_dir.join("series.msgpack");
            if series_file.is_file() {
                analyzer
                    .add_series_file(&series_file)
                    .with_context(|| format!("failed to add {series_file:?}"))?;
            }

            let results_file = run_dir.join("results.msgpack");
            analyzer
                .save_results(&results_file)
                .with_context(|| format!("failed to save {results_file:?}"))?;
            log::info!("analyzed {} run set(s) in {run_dir:?}", analyzer.reports().len());
        }

        Ok(())
    }

    /// Remove every run dir.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn seed(&self) -> u64 {
        let seed = self.cfg.run.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("seed = {seed}");
        seed
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut run_dirs: Vec<_> = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        run_dirs.sort();
        Ok(run_dirs)
    }

    fn create_run_dir(&self) -> Result<PathBuf> {
        let run_idx = self.run_dirs()?.len();
        let run_dir = self.sim_dir.join(format!("run-{run_idx:04}"));
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");
        Ok(run_dir)
    }
}
