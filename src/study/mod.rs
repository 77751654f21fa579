//! Multi-objective study: runs trials and keeps their history.

mod builder;

use std::sync::Arc;

pub use builder::StudyBuilder;

use crate::error::{Error, Result};
use crate::pareto;
use crate::sampler::Sampler;
use crate::storage::Storage;
use crate::trial::{CompletedTrial, Trial};
use crate::types::{Direction, TrialState};

/// A study manages trials against one or more objectives.
///
/// Each trial evaluates the objective once and reports one value per
/// direction. There is no single best trial; [`best_trials`](Self::best_trials)
/// returns the Pareto front of completed trials.
///
/// # Examples
///
/// ```
/// use rrtune::sampler::MotpeSampler;
/// use rrtune::{Direction, Study};
///
/// let study = Study::builder()
///     .directions(vec![Direction::Minimize, Direction::Minimize])
///     .sampler(MotpeSampler::builder().seed(42).build())
///     .build()
///     .unwrap();
///
/// study
///     .optimize(30, |trial| {
///         let x = trial.suggest_float("x", 0.0, 1.0)?;
///         Ok::<_, rrtune::Error>(vec![x, 1.0 - x])
///     })
///     .unwrap();
///
/// assert_eq!(study.n_trials(), 30);
/// assert!(!study.best_trials().is_empty());
/// ```
pub struct Study {
    study_name: String,
    directions: Vec<Direction>,
    sampler: Arc<dyn Sampler>,
    storage: Arc<dyn Storage>,
}

impl core::fmt::Debug for Study {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Study")
            .field("study_name", &self.study_name)
            .field("directions", &self.directions)
            .field("n_trials", &self.n_trials())
            .finish_non_exhaustive()
    }
}

impl Study {
    /// Return a [`StudyBuilder`] for fluent configuration.
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::new()
    }

    /// The study name.
    #[must_use]
    pub fn study_name(&self) -> &str {
        &self.study_name
    }

    /// One direction per objective.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Number of objectives.
    #[must_use]
    pub fn n_objectives(&self) -> usize {
        self.directions.len()
    }

    /// Snapshot of every recorded trial, failed ones included.
    #[must_use]
    pub fn trials(&self) -> Vec<CompletedTrial> {
        self.storage.trials_arc().read().clone()
    }

    /// Number of recorded trials, failed ones included.
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.storage.trials_arc().read().len()
    }

    /// Completed trials on the Pareto front.
    #[must_use]
    pub fn best_trials(&self) -> Vec<CompletedTrial> {
        let trials = self.storage.trials_arc().read();
        let complete: Vec<&CompletedTrial> = trials.iter().filter(|t| t.is_complete()).collect();
        let values: Vec<Vec<f64>> = complete.iter().map(|t| t.values.clone()).collect();

        pareto::pareto_front_indices(&values, &self.directions)
            .into_iter()
            .map(|i| complete[i].clone())
            .collect()
    }

    /// Create a new trial wired to this study's sampler and history.
    ///
    /// Pair it with [`tell`](Self::tell) to drive the study by hand.
    #[must_use]
    pub fn ask(&self) -> Trial {
        Trial::with_sampler(
            self.storage.next_trial_id(),
            Arc::clone(&self.sampler),
            Arc::clone(self.storage.trials_arc()),
            self.directions.clone(),
        )
    }

    /// Record the outcome of a trial obtained from [`ask`](Self::ask).
    ///
    /// An `Err` outcome stores the trial as
    /// [`Failed`](TrialState::Failed) and returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// - [`Error::ObjectiveDimensionMismatch`] if the number of values
    ///   differs from the number of directions. Nothing is stored.
    /// - Any error from the storage backend.
    pub fn tell<E: ToString>(
        &self,
        mut trial: Trial,
        outcome: core::result::Result<Vec<f64>, E>,
    ) -> Result<()> {
        match outcome {
            Ok(values) => {
                if values.len() != self.directions.len() {
                    return Err(Error::ObjectiveDimensionMismatch {
                        expected: self.directions.len(),
                        got: values.len(),
                    });
                }
                #[cfg(feature = "tracing")]
                let trial_id = trial.id();
                trial.set_complete();
                self.storage.push(trial.into_record(values))?;
                trace_info!(trial_id, "trial completed");
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                let trial_id = trial.id();
                let reason = e.to_string();
                trial.set_failed();
                trial.set_user_attr("fail_reason", reason.as_str());
                self.storage.push(trial.into_record(Vec::new()))?;
                trace_warn!(trial_id, reason = %reason, "trial failed");
            }
        }
        Ok(())
    }

    /// Run `n_trials` evaluations of `objective` sequentially.
    ///
    /// A trial whose objective returns `Err` is recorded as failed and the
    /// loop moves on.
    ///
    /// # Errors
    ///
    /// - [`Error::ObjectiveDimensionMismatch`] aborts the run.
    /// - Storage errors abort the run.
    /// - [`Error::NoCompletedTrials`] if at least one trial ran and, after
    ///   the loop, the study holds no completed trial. Asking for zero
    ///   trials is a no-op.
    pub fn optimize<F, E>(&self, n_trials: usize, mut objective: F) -> Result<()>
    where
        F: FnMut(&mut Trial) -> core::result::Result<Vec<f64>, E>,
        E: ToString,
    {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::info_span!("optimize", study_name = %self.study_name, n_trials).entered();

        for _ in 0..n_trials {
            let mut trial = self.ask();
            let outcome = objective(&mut trial);
            self.tell(trial, outcome)?;
        }

        if n_trials == 0 {
            return Ok(());
        }

        let has_complete = self
            .storage
            .trials_arc()
            .read()
            .iter()
            .any(|t| t.state == TrialState::Complete);
        if !has_complete {
            return Err(Error::NoCompletedTrials);
        }

        Ok(())
    }
}
