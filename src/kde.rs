//! Gaussian kernel density estimation for continuous parameters.
//!
//! The MOTPE sampler fits one estimator to the Pareto-optimal trials and
//! one to the dominated trials, then ranks candidates by their density
//! ratio.

use crate::error::{Error, Result};
use crate::rng_util;

/// A Gaussian kernel density estimator over one dimension.
///
/// Places a Gaussian kernel of standard deviation `bandwidth` on every
/// sample point.
#[derive(Clone, Debug)]
pub(crate) struct KernelDensityEstimator {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl KernelDensityEstimator {
    /// Creates a new KDE with automatic bandwidth selection using Scott's rule.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySamples` if `samples` is empty.
    pub(crate) fn new(samples: Vec<f64>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples);
        }

        let bandwidth = Self::scotts_rule(&samples);
        Ok(Self { samples, bandwidth })
    }

    /// Creates a new KDE with a specified bandwidth.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySamples` if `samples` is empty and
    /// `Error::InvalidBandwidth` if `bandwidth` is not positive.
    pub(crate) fn with_bandwidth(samples: Vec<f64>, bandwidth: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples);
        }
        if bandwidth <= 0.0 {
            return Err(Error::InvalidBandwidth(bandwidth));
        }

        Ok(Self { samples, bandwidth })
    }

    /// Scott's rule: h = n^(-1/5) * sigma.
    #[allow(clippy::cast_precision_loss)]
    fn scotts_rule(samples: &[f64]) -> f64 {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        // Identical samples: fall back to a unit kernel.
        if std_dev < f64::EPSILON {
            return 1.0;
        }

        n.powf(-0.2) * std_dev
    }

    /// Returns the probability density at point `x`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn pdf(&self, x: f64) -> f64 {
        let n = self.samples.len() as f64;
        let inv_bandwidth = 1.0 / self.bandwidth;
        let normalization = inv_bandwidth / (2.0 * core::f64::consts::PI).sqrt();

        let density: f64 = self
            .samples
            .iter()
            .map(|&xi| {
                let z = (x - xi) * inv_bandwidth;
                normalization * (-0.5 * z * z).exp()
            })
            .sum();

        density / n
    }

    /// Samples by picking a kernel centre uniformly and adding Gaussian
    /// noise with the bandwidth as standard deviation.
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> f64 {
        let center = self.samples[rng.usize(0..self.samples.len())];
        center + rng_util::standard_normal(rng) * self.bandwidth
    }

    #[cfg(test)]
    pub(crate) fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}
