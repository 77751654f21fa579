//! Bounded float parameters suggested from a [`Trial`].
//!
//! # Example
//!
//! ```
//! use rrtune::Trial;
//! use rrtune::parameter::FloatParam;
//!
//! let mut trial = Trial::new(0);
//!
//! let dp_weight = FloatParam::new("dp weight", 1e-3, 10.0)
//!     .suggest(&mut trial)
//!     .unwrap();
//! let lr = FloatParam::new("lr", 1e-5, 1e-1)
//!     .log_scale()
//!     .suggest(&mut trial)
//!     .unwrap();
//! assert!((1e-3..=10.0).contains(&dp_weight));
//! assert!((1e-5..=1e-1).contains(&lr));
//! ```

use crate::distribution::FloatDistribution;
use crate::error::{Error, Result};
use crate::trial::Trial;

/// A named floating-point parameter with optional log-scale and step size.
///
/// The name is the parameter's identity: it keys the value in the trial
/// record, in persisted storage, and in the sampler's history lookup, so
/// two `FloatParam`s with the same name refer to the same logical
/// parameter.
#[derive(Clone, Debug)]
pub struct FloatParam {
    name: String,
    low: f64,
    high: f64,
    log_scale: bool,
    step: Option<f64>,
}

impl FloatParam {
    /// Creates a new float parameter with the given bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            log_scale: false,
            step: None,
        }
    }

    /// Enables log-scale sampling.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.log_scale = true;
        self
    }

    /// Sets a step size for discretized sampling.
    #[must_use]
    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the distribution that this parameter samples from.
    #[must_use]
    pub fn distribution(&self) -> FloatDistribution {
        FloatDistribution {
            low: self.low,
            high: self.high,
            log_scale: self.log_scale,
            step: self.step,
        }
    }

    /// Validates the parameter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if `low > high` or either bound is
    /// not finite, [`Error::InvalidLogBounds`] if log scale is requested
    /// with a non-positive lower bound, and [`Error::InvalidStep`] for a
    /// non-positive step.
    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(Error::InvalidBounds {
                low: self.low,
                high: self.high,
            });
        }
        if self.log_scale && self.low <= 0.0 {
            return Err(Error::InvalidLogBounds);
        }
        if let Some(step) = self.step {
            if step <= 0.0 {
                return Err(Error::InvalidStep);
            }
        }
        Ok(())
    }

    /// Suggests a value for this parameter from the given trial.
    ///
    /// Delegates to [`Trial::suggest_param`].
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the name was already
    /// suggested in this trial with a different distribution.
    pub fn suggest(&self, trial: &mut Trial) -> Result<f64> {
        trial.suggest_param(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let p = FloatParam::new("x", 1.0, 0.0);
        assert!(matches!(p.validate(), Err(Error::InvalidBounds { .. })));
    }

    #[test]
    fn test_validate_rejects_log_with_zero_low() {
        let p = FloatParam::new("x", 0.0, 1.0).log_scale();
        assert!(matches!(p.validate(), Err(Error::InvalidLogBounds)));
    }

    #[test]
    fn test_validate_rejects_negative_step() {
        let p = FloatParam::new("x", 0.0, 1.0).step(-0.5);
        assert!(matches!(p.validate(), Err(Error::InvalidStep)));
    }

    #[test]
    fn test_distribution_carries_options() {
        let d = FloatParam::new("x", 1e-3, 1.0)
            .log_scale()
            .step(1e-3)
            .distribution();
        assert!(d.log_scale);
        assert_eq!(d.step, Some(1e-3));
        assert!((d.low - 1e-3).abs() < f64::EPSILON);
    }
}
