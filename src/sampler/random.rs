//! Random sampler implementation.

use parking_lot::Mutex;

use crate::distribution::FloatDistribution;
use crate::rng_util;
use crate::sampler::Sampler;
use crate::trial::CompletedTrial;
use crate::types::Direction;

/// A simple random sampler that samples uniformly from distributions.
///
/// This sampler ignores the trial history and samples uniformly at random,
/// respecting log scale and step size constraints. It serves as a baseline
/// and as the startup phase of [`MotpeSampler`](super::MotpeSampler).
///
/// # Examples
///
/// ```
/// use rrtune::sampler::RandomSampler;
///
/// let sampler = RandomSampler::new();
/// let seeded = RandomSampler::with_seed(42);
/// ```
pub struct RandomSampler {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSampler {
    /// Creates a new random sampler with a default random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a new random sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws one value uniformly from `d` (in log space when requested).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn sample_uniform(d: &FloatDistribution, rng: &mut fastrand::Rng) -> f64 {
    if d.log_scale {
        let log_value = rng_util::f64_range(rng, d.low.ln(), d.high.ln());
        log_value.exp().clamp(d.low, d.high)
    } else if let Some(step) = d.step {
        let n_steps = ((d.high - d.low) / step).floor() as i64;
        let k = rng.i64(0..=n_steps);
        d.low + (k as f64) * step
    } else {
        rng_util::f64_range(rng, d.low, d.high)
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &self,
        _name: &str,
        distribution: &FloatDistribution,
        _trial_id: u64,
        _history: &[CompletedTrial],
        _directions: &[Direction],
    ) -> f64 {
        let mut rng = self.rng.lock();
        sample_uniform(distribution, &mut rng)
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn dist(low: f64, high: f64, log_scale: bool, step: Option<f64>) -> FloatDistribution {
        FloatDistribution {
            low,
            high,
            log_scale,
            step,
        }
    }

    #[test]
    fn test_random_sampler_float() {
        let sampler = RandomSampler::with_seed(42);
        let d = dist(1e-3, 10.0, false, None);
        for _ in 0..100 {
            let v = sampler.sample("dp weight", &d, 0, &[], &[]);
            assert!((1e-3..=10.0).contains(&v));
        }
    }

    #[test]
    fn test_random_sampler_log() {
        let sampler = RandomSampler::with_seed(42);
        let d = dist(1e-5, 1.0, true, None);
        for _ in 0..100 {
            let v = sampler.sample("x", &d, 0, &[], &[]);
            assert!((1e-5..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_random_sampler_step() {
        let sampler = RandomSampler::with_seed(42);
        let d = dist(0.0, 1.0, false, Some(0.25));
        for _ in 0..100 {
            let v = sampler.sample("x", &d, 0, &[], &[]);
            assert!((0.0..=1.0).contains(&v));
            let k = (v / 0.25).round() as i64;
            assert!((v - k as f64 * 0.25).abs() < 1e-10);
        }
    }

    #[test]
    fn test_random_sampler_reproducibility() {
        let s1 = RandomSampler::with_seed(42);
        let s2 = RandomSampler::with_seed(42);
        let d = dist(0.0, 1.0, false, None);
        for _ in 0..10 {
            assert_eq!(
                s1.sample("x", &d, 0, &[], &[]).to_bits(),
                s2.sample("x", &d, 0, &[], &[]).to_bits()
            );
        }
    }
}
