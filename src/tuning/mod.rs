//! Multi-objective tuning of the penalty weights.
//!
//! Each trial samples the three weights, trains a mechanism with the
//! composed penalty, and scores the result on four minimized objectives:
//! accuracy (`logp_loss`), distance from the privacy target
//! (`dp_params_loss`), and two measures of mass on the furthest category
//! (`dist_loss`, `far_mass_norm`).
//!
//! # Example
//!
//! ```
//! use rrtune::tuning::{TuningConfig, run};
//!
//! let config = TuningConfig {
//!     n_iters: 5,
//!     n_trials: 2,
//!     ..TuningConfig::default()
//! };
//! let study = run(&config).unwrap();
//! assert_eq!(study.n_trials(), 2);
//! ```

mod config;
mod objective;
mod run;

pub use config::{StorageConfig, TuningConfig};
pub use objective::{
    DIST_WEIGHT, DP_WEIGHT, FAR_MASS_THRESHOLD, L2_WEIGHT, N_OBJECTIVES, TrialScore,
    TuningObjective, WeightSpace,
};
pub use run::{run, run_with};
