//! Wires the privacy target, objective, storage and sampler into a study run.

use std::sync::Arc;

use super::config::{StorageConfig, TuningConfig};
use super::objective::{N_OBJECTIVES, TuningObjective};
use crate::error::Result;
use crate::mechanism::{
    CategoryTable, DpMode, PenaltyComposer, PenaltyFactory, PrivacyTarget, SgdTrainer,
    StandardPenalties, Trainer,
};
use crate::sampler::MotpeSampler;
use crate::storage::{MemoryStorage, Storage};
use crate::study::Study;
use crate::types::Direction;

/// Runs a tuning study with the built-in penalties and [`SgdTrainer`] on
/// the default 78-seat table.
///
/// # Errors
///
/// See [`run_with`].
pub fn run(config: &TuningConfig) -> Result<Study> {
    let table = Arc::new(CategoryTable::default_seats());
    let trainer = SgdTrainer::new(Arc::clone(&table), config.learning_rate);
    run_with(config, table, &StandardPenalties, trainer)
}

/// Runs a tuning study with caller-supplied collaborators.
///
/// The privacy target is validated before any storage is opened, so an
/// invalid target leaves no trace on disk.
///
/// # Errors
///
/// - [`Error::InvalidPrivacyParams`](crate::Error::InvalidPrivacyParams)
///   for an invalid target.
/// - Storage errors when opening or writing the study.
/// - [`Error::NoCompletedTrials`](crate::Error::NoCompletedTrials) if every
///   trial failed. A run with `n_trials == 0` succeeds without running any.
pub fn run_with<T: Trainer>(
    config: &TuningConfig,
    table: Arc<CategoryTable>,
    factory: &dyn PenaltyFactory,
    trainer: T,
) -> Result<Study> {
    let target = PrivacyTarget::new(config.epsilon, config.delta)?;
    match target.mode() {
        DpMode::Pure => {
            trace_info!(
                epsilon = target.epsilon(),
                "running weight tuning under pure DP"
            );
        }
        DpMode::Approximate => {
            trace_info!(
                epsilon = target.epsilon(),
                delta = target.delta(),
                "running weight tuning under approximate DP"
            );
        }
    }

    let composer = PenaltyComposer::new(factory, table.distance_matrix(), target);
    let mut objective = TuningObjective::new(table, composer, trainer, config.n_iters, config.seed)
        .silent(config.silent);

    let storage = open_storage(config)?;
    let n_stored = storage.trials_arc().read().len();
    let study = Study::builder()
        .study_name(config.study_name.as_str())
        .directions(vec![Direction::Minimize; N_OBJECTIVES])
        .sampler(MotpeSampler::with_seed(sampler_seed(config.seed, n_stored)))
        .boxed_storage(storage)
        .build()?;

    study.optimize(config.n_trials, |trial| objective.evaluate(trial))?;

    trace_info!(
        n_trials = study.n_trials(),
        pareto_size = study.best_trials().len(),
        "weight tuning finished"
    );
    Ok(study)
}

/// Sampler seed for a session that starts after `n_stored` trials.
///
/// A fresh study uses `seed` as is. A resumed study mixes in its trial
/// count so it does not replay the draws of earlier sessions.
fn sampler_seed(seed: u64, n_stored: usize) -> u64 {
    let n = u64::try_from(n_stored).unwrap_or(u64::MAX);
    seed ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn open_storage(config: &TuningConfig) -> Result<Box<dyn Storage>> {
    Ok(match &config.storage {
        StorageConfig::Memory => Box::new(MemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageConfig::Sqlite(path) => Box::new(crate::storage::SqliteStorage::open(
            path,
            &config.study_name,
            &[Direction::Minimize; N_OBJECTIVES],
            true,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_invalid_target_rejected_before_any_trial() {
        let table = Arc::new(CategoryTable::new(3, 2, &[1, 3]).unwrap());
        let config = TuningConfig {
            epsilon: 0.0,
            ..TuningConfig::default()
        };
        let trainer = SgdTrainer::new(Arc::clone(&table), 0.01);
        let err = run_with(&config, table, &StandardPenalties, trainer).unwrap_err();
        assert!(matches!(err, Error::InvalidPrivacyParams { .. }));
    }

    #[test]
    fn test_zero_trials_runs_nothing() {
        let table = Arc::new(CategoryTable::new(3, 2, &[1, 3]).unwrap());
        let config = TuningConfig {
            n_trials: 0,
            ..TuningConfig::default()
        };
        let trainer = SgdTrainer::new(Arc::clone(&table), 0.01);
        let study = run_with(&config, table, &StandardPenalties, trainer).unwrap();
        assert_eq!(study.n_trials(), 0);
    }

    #[test]
    fn test_sampler_seed_changes_on_resume() {
        assert_eq!(sampler_seed(123, 0), 123);
        assert_ne!(sampler_seed(123, 2), 123);
        assert_ne!(sampler_seed(123, 2), sampler_seed(123, 4));
    }

    #[test]
    fn test_small_run_completes() {
        let table = Arc::new(CategoryTable::new(5, 2, &[2, 5]).unwrap());
        let config = TuningConfig {
            n_iters: 20,
            n_trials: 3,
            ..TuningConfig::default()
        };
        let trainer = SgdTrainer::new(Arc::clone(&table), 0.05);
        let study = run_with(&config, table, &StandardPenalties, trainer).unwrap();
        assert_eq!(study.n_trials(), 3);
        assert_eq!(study.n_objectives(), 4);
        assert!(study.trials().iter().all(|t| t.is_complete()));
    }
}
