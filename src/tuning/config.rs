//! Settings for one tuning run.

#[cfg(feature = "sqlite")]
use std::path::PathBuf;

/// Where a tuning run keeps its trials.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StorageConfig {
    /// Trials live in memory and are lost when the run ends.
    #[default]
    Memory,
    /// Trials are written to an `SQLite` database; an existing study with
    /// the same name is resumed.
    #[cfg(feature = "sqlite")]
    Sqlite(PathBuf),
}

/// Everything a tuning run needs.
///
/// # Examples
///
/// ```
/// use rrtune::tuning::TuningConfig;
///
/// let config = TuningConfig {
///     n_trials: 5,
///     delta: 0.0,
///     ..TuningConfig::default()
/// };
/// assert_eq!(config.seed, 123);
/// assert_eq!(config.study_name, "hyperparam-opt-test1");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TuningConfig {
    /// Target epsilon, must be positive.
    pub epsilon: f64,
    /// Target delta in `[0, 1]`; 0 selects pure DP.
    pub delta: f64,
    /// Seeds both the trainer's initialization and the sampler.
    pub seed: u64,
    /// Training iterations per trial.
    pub n_iters: usize,
    /// Number of trials to run.
    pub n_trials: usize,
    /// Study identity, used as the storage key.
    pub study_name: String,
    pub storage: StorageConfig,
    /// Trainer step size.
    pub learning_rate: f64,
    /// Suppress training progress events.
    pub silent: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            delta: 1e-5,
            seed: 123,
            n_iters: 100_000,
            n_trials: 2,
            study_name: "hyperparam-opt-test1".to_owned(),
            storage: StorageConfig::Memory,
            learning_rate: 0.01,
            silent: true,
        }
    }
}
