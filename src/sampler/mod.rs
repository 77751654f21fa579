//! Sampler trait and implementations for parameter sampling.
//!
//! | Sampler | Algorithm |
//! |---------|-----------|
//! | [`RandomSampler`] | Uniform random (log / step aware) |
//! | [`MotpeSampler`] | Multi-objective Tree-Parzen Estimator |

pub mod motpe;
pub mod random;

pub use motpe::{MotpeSampler, MotpeSamplerBuilder};
pub use random::RandomSampler;

use crate::distribution::FloatDistribution;
use crate::trial::CompletedTrial;
use crate::types::Direction;

/// Trait for pluggable parameter sampling strategies.
///
/// Samplers receive the parameter's name and distribution together with
/// the study's finished trials and objective directions, so
/// history-aware strategies can look up earlier values of the same
/// parameter. The trait requires `Send + Sync` because studies share
/// samplers behind an `Arc`.
pub trait Sampler: Send + Sync {
    /// Samples a value from `distribution` for the parameter `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - The parameter name (its identity across trials).
    /// * `distribution` - The bounded distribution to sample from.
    /// * `trial_id` - The unique ID of the trial being sampled for.
    /// * `history` - Finished trials, including failed ones.
    /// * `directions` - One direction per objective.
    fn sample(
        &self,
        name: &str,
        distribution: &FloatDistribution,
        trial_id: u64,
        history: &[CompletedTrial],
        directions: &[Direction],
    ) -> f64;
}
