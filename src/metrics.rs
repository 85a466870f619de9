//! Outbreak metrics shared by every engine.

/// Fraction of the population that must be infected for an outbreak.
pub const OUTBREAK_THRESHOLD: f64 = 0.05;

/// Final size below which a run counts as extinct.
///
/// Also the point past which the extinction shortcut stops a trial.
pub const EXTINCTION_CUTOFF: usize = 50;

/// Number of consecutive entries of `is` at or above the outbreak threshold.
///
/// Counting starts at the first entry reaching the threshold and stops at the
/// first later entry below it.
pub fn outbreak_duration(is: &[f64], n: usize) -> f64 {
    let threshold = OUTBREAK_THRESHOLD * n as f64;
    let duration = is
        .iter()
        .skip_while(|&&infected| infected < threshold)
        .take_while(|&&infected| infected >= threshold)
        .count();
    duration as f64
}

/// Index of the first maximum of `is`, or zero for an empty series.
pub fn peak_time(is: &[f64]) -> f64 {
    let mut peak_time = 0;
    let mut peak_infected = 0.0;
    for (t, &infected) in is.iter().enumerate() {
        if infected > peak_infected {
            peak_time = t;
            peak_infected = infected;
        }
    }
    peak_time as f64
}

pub fn is_extinct(final_r: f64) -> bool {
    final_r < EXTINCTION_CUTOFF as f64
}

/// Summary of an infected-over-time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outbreak {
    pub max_i: f64,
    pub duration: f64,
    pub peak_time: f64,
}

impl Outbreak {
    /// Measure `is`, recorded every `dt` time units, for a population of `n`.
    pub fn measure(is: &[f64], n: usize, dt: f64) -> Self {
        let max_i = is.iter().copied().fold(0.0, f64::max);
        Self {
            max_i,
            duration: outbreak_duration(is, n) * dt,
            peak_time: peak_time(is) * dt,
        }
    }
}
