//! Multi-Objective Tree-Parzen Estimator (MOTPE) sampler.
//!
//! MOTPE extends TPE to multi-objective optimization by replacing the gamma-based
//! split with Pareto non-dominated sorting:
//!
//! 1. Compute non-dominated sorting on all completed trials.
//! 2. Use the Pareto front (rank 0) as "good" trials.
//! 3. Use dominated trials (rank 1+) as "bad" trials.
//! 4. Build KDE l(x) from good, g(x) from bad, per parameter name.
//! 5. Sample candidates from l(x) and keep the one maximizing l(x)/g(x).
//!
//! # Configuration
//!
//! - `n_startup_trials` — number of random trials before MOTPE kicks in (default: 11)
//! - `n_ei_candidates` — candidates evaluated per sample (default: 24)
//! - `kde_bandwidth` — optional fixed KDE bandwidth; `None` uses Scott's rule
//! - `seed` — optional seed for reproducibility
//!
//! # Examples
//!
//! ```
//! use rrtune::sampler::MotpeSampler;
//! use rrtune::{Direction, Study};
//!
//! let study = Study::builder()
//!     .directions(vec![Direction::Minimize, Direction::Minimize])
//!     .sampler(MotpeSampler::builder().seed(42).build())
//!     .build()
//!     .unwrap();
//!
//! study
//!     .optimize(30, |trial| {
//!         let x = trial.suggest_float("x", 0.0, 1.0)?;
//!         Ok::<_, rrtune::Error>(vec![x, 1.0 - x])
//!     })
//!     .unwrap();
//!
//! assert!(!study.best_trials().is_empty());
//! ```

use parking_lot::Mutex;

use crate::distribution::FloatDistribution;
use crate::kde::KernelDensityEstimator;
use crate::pareto;
use crate::sampler::Sampler;
use crate::sampler::random::sample_uniform;
use crate::trial::CompletedTrial;
use crate::types::Direction;

/// Multi-Objective TPE (MOTPE) sampler for multi-objective Bayesian optimization.
///
/// During the startup phase (fewer than `n_startup_trials` completed),
/// MOTPE falls back to random sampling. It also falls back whenever
/// either the good or the bad group has no recorded value for the
/// requested parameter.
pub struct MotpeSampler {
    /// Number of trials before MOTPE kicks in (uses random sampling before this).
    n_startup_trials: usize,
    /// Number of candidate samples to evaluate when selecting the next point.
    n_ei_candidates: usize,
    /// Optional fixed bandwidth for KDE. If None, uses Scott's rule.
    kde_bandwidth: Option<f64>,
    rng: Mutex<fastrand::Rng>,
}

impl MotpeSampler {
    /// Creates a new MOTPE sampler with default settings.
    #[must_use]
    pub fn new() -> Self {
        MotpeSamplerBuilder::new().build()
    }

    /// Creates a new MOTPE sampler with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        MotpeSamplerBuilder::new().seed(seed).build()
    }

    /// Creates a builder for configuring a MOTPE sampler.
    #[must_use]
    pub fn builder() -> MotpeSamplerBuilder {
        MotpeSamplerBuilder::new()
    }

    /// Splits completed trials into good (non-dominated) and bad
    /// (dominated) groups.
    fn split_trials<'a>(
        history: &'a [CompletedTrial],
        directions: &[Direction],
    ) -> (Vec<&'a CompletedTrial>, Vec<&'a CompletedTrial>) {
        let complete: Vec<&CompletedTrial> = history
            .iter()
            .filter(|t| t.is_complete() && t.values.len() == directions.len())
            .collect();

        let values: Vec<Vec<f64>> = complete.iter().map(|t| t.values.clone()).collect();
        let fronts = pareto::non_dominated_sort(&values, directions);

        let Some((front, rest)) = fronts.split_first() else {
            return (vec![], vec![]);
        };

        let good = front.iter().map(|&i| complete[i]).collect();
        let bad = rest.iter().flatten().map(|&i| complete[i]).collect();
        (good, bad)
    }

    /// Values of `name` recorded by `trials` that lie inside `d`.
    fn values_of(trials: &[&CompletedTrial], name: &str, d: &FloatDistribution) -> Vec<f64> {
        trials
            .iter()
            .filter_map(|t| t.param(name))
            .filter(|&v| d.contains(v))
            .map(|v| d.to_internal(v))
            .collect()
    }

    fn fit(&self, samples: Vec<f64>) -> crate::Result<KernelDensityEstimator> {
        match self.kde_bandwidth {
            Some(bw) => KernelDensityEstimator::with_bandwidth(samples, bw),
            None => KernelDensityEstimator::new(samples),
        }
    }

    fn sample_tpe(
        &self,
        d: &FloatDistribution,
        good_internal: Vec<f64>,
        bad_internal: Vec<f64>,
        rng: &mut fastrand::Rng,
    ) -> f64 {
        let (Ok(l_kde), Ok(g_kde)) = (self.fit(good_internal), self.fit(bad_internal)) else {
            return sample_uniform(d, rng);
        };

        let internal_low = d.to_internal(d.low);
        let internal_high = d.to_internal(d.high);

        let mut best_candidate = internal_low;
        let mut best_ratio = f64::NEG_INFINITY;

        for _ in 0..self.n_ei_candidates {
            let candidate = l_kde.sample(rng).clamp(internal_low, internal_high);

            let l_density = l_kde.pdf(candidate);
            let g_density = g_kde.pdf(candidate);

            let ratio = if g_density < f64::EPSILON {
                if l_density > f64::EPSILON {
                    f64::INFINITY
                } else {
                    0.0
                }
            } else {
                l_density / g_density
            };

            if ratio > best_ratio {
                best_ratio = ratio;
                best_candidate = candidate;
            }
        }

        d.from_internal(best_candidate)
    }
}

impl Default for MotpeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for MotpeSampler {
    fn sample(
        &self,
        name: &str,
        distribution: &FloatDistribution,
        _trial_id: u64,
        history: &[CompletedTrial],
        directions: &[Direction],
    ) -> f64 {
        let mut rng = self.rng.lock();

        let n_complete = history.iter().filter(|t| t.is_complete()).count();
        if n_complete < self.n_startup_trials {
            return sample_uniform(distribution, &mut rng);
        }

        let (good_trials, bad_trials) = Self::split_trials(history, directions);
        let good = Self::values_of(&good_trials, name, distribution);
        let bad = Self::values_of(&bad_trials, name, distribution);

        if good.is_empty() || bad.is_empty() {
            return sample_uniform(distribution, &mut rng);
        }

        self.sample_tpe(distribution, good, bad, &mut rng)
    }
}

/// Builder for configuring a [`MotpeSampler`].
///
/// # Defaults
///
/// - `n_startup_trials`: 11
/// - `n_ei_candidates`: 24
/// - `kde_bandwidth`: None (Scott's rule)
/// - `seed`: None (OS entropy)
#[derive(Debug, Clone)]
pub struct MotpeSamplerBuilder {
    n_startup_trials: usize,
    n_ei_candidates: usize,
    kde_bandwidth: Option<f64>,
    seed: Option<u64>,
}

impl MotpeSamplerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_startup_trials: 11,
            n_ei_candidates: 24,
            kde_bandwidth: None,
            seed: None,
        }
    }

    /// Sets the number of startup trials before MOTPE sampling begins.
    #[must_use]
    pub fn n_startup_trials(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    /// Sets the number of EI candidates to evaluate per sample.
    #[must_use]
    pub fn n_ei_candidates(mut self, n: usize) -> Self {
        self.n_ei_candidates = n;
        self
    }

    /// Sets a fixed bandwidth for the kernel density estimator.
    #[must_use]
    pub fn kde_bandwidth(mut self, bandwidth: f64) -> Self {
        self.kde_bandwidth = Some(bandwidth);
        self
    }

    /// Sets a seed for reproducible sampling.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured [`MotpeSampler`].
    #[must_use]
    pub fn build(self) -> MotpeSampler {
        let rng = match self.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };

        MotpeSampler {
            n_startup_trials: self.n_startup_trials,
            n_ei_candidates: self.n_ei_candidates,
            kde_bandwidth: self.kde_bandwidth,
            rng: Mutex::new(rng),
        }
    }
}

impl Default for MotpeSamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
