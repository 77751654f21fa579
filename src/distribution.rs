//! Parameter distribution types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distribution for bounded floating-point parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Whether to sample in log space.
    pub log_scale: bool,
    /// Optional step size for discretization.
    pub step: Option<f64>,
}

impl FloatDistribution {
    /// Returns `true` if `value` lies within `[low, high]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Maps a value into the space samplers model in (log space when
    /// `log_scale` is set).
    #[must_use]
    pub(crate) fn to_internal(&self, value: f64) -> f64 {
        if self.log_scale { value.ln() } else { value }
    }

    /// Inverse of [`to_internal`](Self::to_internal), snapped to the step
    /// grid and clamped to the bounds.
    #[must_use]
    pub(crate) fn from_internal(&self, internal: f64) -> f64 {
        let mut value = if self.log_scale {
            internal.exp()
        } else {
            internal
        };
        if let Some(step) = self.step {
            let k = ((value - self.low) / step).round();
            value = self.low + k * step;
        }
        value.clamp(self.low, self.high)
    }
}
