//! Target privacy budget and the DP form it selects.

use crate::error::{Error, Result};

/// Which differential-privacy form a target calls for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DpMode {
    /// `delta == 0`: pure ε-DP.
    Pure,
    /// `delta > 0`: approximate (ε, δ)-DP.
    Approximate,
}

impl DpMode {
    /// Short label used in logs and trial attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::Approximate => "approx",
        }
    }
}

impl core::fmt::Display for DpMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated privacy budget: `epsilon > 0` and `0 <= delta <= 1`.
///
/// # Examples
///
/// ```
/// use rrtune::mechanism::{DpMode, PrivacyTarget};
///
/// let target = PrivacyTarget::new(1.0, 0.0).unwrap();
/// assert_eq!(target.mode(), DpMode::Pure);
///
/// assert!(PrivacyTarget::new(0.0, 1e-5).is_err());
/// assert!(PrivacyTarget::new(1.0, 1.5).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrivacyTarget {
    epsilon: f64,
    delta: f64,
}

impl PrivacyTarget {
    /// Validates and wraps a privacy budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrivacyParams`] unless `epsilon > 0` and
    /// `0 <= delta <= 1`. NaN fails both checks.
    pub fn new(epsilon: f64, delta: f64) -> Result<Self> {
        if epsilon > 0.0 && (0.0..=1.0).contains(&delta) {
            Ok(Self { epsilon, delta })
        } else {
            Err(Error::InvalidPrivacyParams { epsilon, delta })
        }
    }

    /// Target epsilon.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Target delta.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// [`DpMode::Pure`] when `delta == 0`.
    #[must_use]
    pub fn mode(&self) -> DpMode {
        if self.delta == 0.0 {
            DpMode::Pure
        } else {
            DpMode::Approximate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive_for_delta() {
        assert!(PrivacyTarget::new(1.0, 0.0).is_ok());
        assert!(PrivacyTarget::new(1.0, 1.0).is_ok());
        assert!(PrivacyTarget::new(1e-9, 0.5).is_ok());
    }

    #[test]
    fn test_rejects_invalid() {
        for (eps, delta) in [
            (0.0, 0.0),
            (-1.0, 0.0),
            (1.0, -1e-9),
            (1.0, 1.5),
            (f64::NAN, 0.0),
            (1.0, f64::NAN),
        ] {
            let err = PrivacyTarget::new(eps, delta).unwrap_err();
            assert!(matches!(err, Error::InvalidPrivacyParams { .. }));
        }
    }

    #[test]
    fn test_mode() {
        assert_eq!(PrivacyTarget::new(1.0, 0.0).unwrap().mode(), DpMode::Pure);
        assert_eq!(
            PrivacyTarget::new(1.0, 1e-5).unwrap().mode(),
            DpMode::Approximate
        );
    }
}
