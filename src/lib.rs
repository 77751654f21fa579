#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Multi-objective tuning of penalty weights for differentially private
//! randomized response mechanisms.
//!
//! A mechanism reports one of a few ordinal categories for a true seat
//! position. It is learned by gradient descent under a weighted sum of
//! three penalties (L2, category distance, DP violation). This crate
//! searches those weights with a multi-objective TPE sampler and ranks the
//! resulting mechanisms by accuracy, distance from the privacy target, and
//! mass on the furthest category.
//!
//! # Getting Started
//!
//! ```
//! use rrtune::prelude::*;
//!
//! let config = TuningConfig {
//!     epsilon: 1.0,
//!     delta: 0.0,
//!     n_iters: 10,
//!     n_trials: 3,
//!     ..TuningConfig::default()
//! };
//! let study = rrtune::tuning::run(&config).unwrap();
//!
//! for trial in study.best_trials() {
//!     println!("{:?} -> {:?}", trial.params, trial.values);
//! }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`CategoryTable`](mechanism::CategoryTable) | Seat-to-category assignment and distance tables. |
//! | [`PenaltyComposer`](mechanism::PenaltyComposer) | Weighted penalty for one privacy target. |
//! | [`DpEvaluator`](mechanism::DpEvaluator) | Empirical epsilon and delta of learned logits. |
//! | [`TuningObjective`](tuning::TuningObjective) | Sample weights, train, evaluate, score. |
//! | [`Study`] | Run trials and keep their history; Pareto front via [`Study::best_trials`]. |
//! | [`Sampler`](sampler::Sampler) | [`MotpeSampler`](sampler::MotpeSampler) or [`RandomSampler`](sampler::RandomSampler). |
//! | [`Storage`](storage::Storage) | In-memory or `SQLite` trial history. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on trial records | via `cli` |
//! | `sqlite` | [`SqliteStorage`](storage::SqliteStorage), studies resumable by name (enables `serde`) | via `cli` |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) | via `cli` |
//! | `cli` | The `rrtune` binary | on |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

mod distribution;
mod error;
mod kde;
pub mod mechanism;
pub mod parameter;
pub mod pareto;
mod rng_util;
pub mod sampler;
pub mod storage;
mod study;
mod trial;
pub mod tuning;
mod types;

pub use distribution::FloatDistribution;
pub use error::{Error, Result};
pub use study::{Study, StudyBuilder};
pub use trial::{AttrValue, CompletedTrial, Trial};
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use rrtune::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::mechanism::{
        CategoryTable, DpEvaluator, DpMetrics, DpMode, Penalty, PenaltyComposer, PenaltyFactory,
        PenaltyWeights, PrivacyTarget, SgdTrainer, StandardPenalties, Trainer,
    };
    pub use crate::parameter::FloatParam;
    pub use crate::sampler::{MotpeSampler, RandomSampler, Sampler};
    #[cfg(feature = "sqlite")]
    pub use crate::storage::SqliteStorage;
    pub use crate::storage::{MemoryStorage, Storage};
    pub use crate::study::{Study, StudyBuilder};
    pub use crate::trial::{AttrValue, CompletedTrial, Trial};
    pub use crate::tuning::{StorageConfig, TuningConfig, TuningObjective};
    pub use crate::types::{Direction, TrialState};
}
